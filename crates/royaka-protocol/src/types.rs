//! Core protocol types for the Royaka wire format.
//!
//! Every message exchanged with the game server is a flat JSON object
//! with a `type` string discriminator. Outbound messages carry their
//! parameters under `data`; inbound messages additionally carry the
//! server's `success`/`message`/`error` verdict fields.
//!
//! The payload schemas under `data` are owned by the server; this crate
//! types the ones the client constructs itself and leaves inbound
//! payloads as raw JSON values that callers pick apart per `type`.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Envelope — the wire message unit
// ---------------------------------------------------------------------------

/// The wire message unit, shared by both directions.
///
/// Outbound shape:
/// ```json
/// { "type": "login", "data": { "username": "alice", "password": "…" } }
/// ```
///
/// Inbound shape:
/// ```json
/// { "type": "login_response", "success": true, "message": "Welcome back",
///   "data": { "session_id": "abc" } }
/// ```
///
/// All fields other than `type` are optional; absent fields are omitted
/// from the serialized form, not written as `null`. Unsolicited pushes
/// (`game_state`, `mana_update`, …) reuse the same shape.
///
/// `type` is a Rust keyword, so the field is named `kind` and renamed
/// on the wire via `#[serde(rename = "type")]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// The message discriminator. Consumers dispatch on this.
    #[serde(rename = "type")]
    pub kind: String,

    /// Server verdict on a request. Absent on outbound messages and on
    /// some pushes; treat absent as success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,

    /// Human-readable server message ("Welcome back", "Wrong password").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Human-readable error string, used by some server handlers in
    /// place of `message`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// The opaque payload. Schema varies per `kind`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Envelope {
    /// Builds an outbound request envelope with a typed payload.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the payload cannot be
    /// represented as JSON.
    pub fn request<T: Serialize>(
        kind: impl Into<String>,
        data: &T,
    ) -> Result<Self, ProtocolError> {
        let value =
            serde_json::to_value(data).map_err(ProtocolError::Encode)?;
        Ok(Self {
            kind: kind.into(),
            success: None,
            message: None,
            error: None,
            data: Some(value),
        })
    }

    /// Builds an outbound envelope with no payload (e.g. `get_desk`).
    pub fn bare(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            success: None,
            message: None,
            error: None,
            data: None,
        }
    }

    /// Whether the server reported success. Messages without a verdict
    /// field (outbound requests, some pushes) count as successful.
    pub fn is_ok(&self) -> bool {
        self.success.unwrap_or(true)
    }

    /// The server's failure text, if any: `error` takes precedence,
    /// then `message`.
    pub fn failure_reason(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }

    /// Deserializes the `data` payload into a typed value.
    ///
    /// # Errors
    /// - [`ProtocolError::InvalidMessage`] if the envelope has no `data`.
    /// - [`ProtocolError::Decode`] if the payload doesn't match `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        let value = self.data.clone().ok_or_else(|| {
            ProtocolError::InvalidMessage(format!(
                "no data field in '{}'",
                self.kind
            ))
        })?;
        serde_json::from_value(value).map_err(ProtocolError::Decode)
    }
}

// ---------------------------------------------------------------------------
// Message kinds
// ---------------------------------------------------------------------------

/// The `type` discriminators exchanged with the server.
///
/// Requests are client → server; the reply kinds and unsolicited pushes
/// are server → client. [`reply_kind`](crate::reply_kind) maps a request
/// to the kind the server answers it with.
pub mod kind {
    // -- Requests --
    pub const LOGIN: &str = "login";
    pub const REGISTER: &str = "register";
    pub const GET_USER: &str = "get_user";
    pub const FIND_MATCH: &str = "find_match";
    pub const GET_DESK: &str = "get_desk";
    pub const GET_GAME: &str = "get_game";
    pub const SELECT_TROOP: &str = "select_troop";
    pub const ATTACK: &str = "attack";
    pub const HEAL: &str = "heal";
    pub const SKIP_TURN: &str = "skip_turn";
    pub const PLAY_AGAIN: &str = "play_again";
    pub const LEAVE_GAME: &str = "leave_game";

    // -- Replies --
    pub const LOGIN_RESPONSE: &str = "login_response";
    pub const REGISTER_RESPONSE: &str = "register_response";
    pub const USER_RESPONSE: &str = "user_response";
    pub const DECK_RESPONSE: &str = "deck_response";
    pub const GAME_RESPONSE: &str = "game_response";
    pub const TROOP_RESPONSE: &str = "troop_response";
    pub const ATTACK_RESPONSE: &str = "attack_response";
    pub const HEAL_RESPONSE: &str = "heal_response";
    pub const SKIP_TURN_RESPONSE: &str = "skip_turn_response";
    pub const PLAY_AGAIN_RESPONSE: &str = "play_again_response";

    // -- Unsolicited pushes --
    pub const MATCH_FOUND: &str = "match_found";
    pub const MATCH_TIMEOUT: &str = "match_timeout";
    pub const MANA_UPDATE: &str = "mana_update";
    pub const GAME_STATE: &str = "game_state";
    pub const GAME_OVER_RESPONSE: &str = "game_over_response";
}

/// Maps a request kind to the kind the server replies with.
///
/// The wire carries no request ids, so request/response correlation is
/// by reply kind alone. Most requests follow the `{request}_response`
/// rule; the server's handlers use a few irregular names, and
/// `find_match`/`leave_game` have no direct reply at all (matchmaking
/// results arrive as unsolicited `match_found`/`match_timeout` pushes).
pub fn reply_kind(request: &str) -> Option<String> {
    match request {
        kind::GET_USER => Some(kind::USER_RESPONSE.to_string()),
        kind::GET_GAME => Some(kind::GAME_RESPONSE.to_string()),
        kind::GET_DESK => Some(kind::DECK_RESPONSE.to_string()),
        kind::SELECT_TROOP => Some(kind::TROOP_RESPONSE.to_string()),
        kind::FIND_MATCH | kind::LEAVE_GAME => None,
        other => Some(format!("{other}_response")),
    }
}

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Matchmaking mode selected in the lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Turn-based battle with the basic rule set.
    Simple,
    /// Real-time battle with mana and troop selection.
    Enhanced,
}

/// Payload for `login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Payload for `register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// Payload for `get_user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRequest {
    pub session_id: String,
}

/// Payload for `find_match`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindMatchRequest {
    pub username: String,
    pub mode: MatchMode,
}

/// Payload for `get_game` and other room-scoped requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRequest {
    pub room_id: String,
    pub username: String,
}

/// Payload for `select_troop`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectTroopRequest {
    pub room_id: String,
    pub username: String,
    pub troop: String,
}

/// Payload for `attack`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackRequest {
    pub room_id: String,
    pub username: String,
    pub troop: String,
    /// The opponent tower being targeted.
    pub target: String,
}

/// Payload for `heal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealRequest {
    pub room_id: String,
    pub username: String,
    pub troop: String,
}

/// Payload for `skip_turn`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipTurnRequest {
    pub room_id: String,
    pub username: String,
}

/// Payload for `play_again`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayAgainRequest {
    pub session_id: String,
}

/// Payload for `leave_game`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveGameRequest {
    pub room_id: String,
    pub username: String,
}

// ---------------------------------------------------------------------------
// Response payloads the client itself consumes
// ---------------------------------------------------------------------------

/// `data` of a successful `login_response`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginData {
    pub session_id: String,
}

/// `data` of a `match_found` push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchFoundData {
    pub room_id: String,
}

// =========================================================================
// Tests
// =========================================================================
