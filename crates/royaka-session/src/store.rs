//! The session store: the client's persisted identity.
//!
//! Tracks the three values the application carries between screens and
//! between runs: `session_id`, `username`, `room_id`. The lifecycle is
//! a small state machine:
//!
//! ```text
//! (signed out) ──begin()──→ (signed in) ──enter_room()──→ (in a match)
//!      ↑                        │    ↑                         │
//!      └────────end()───────────┘    └──────leave_room()───────┘
//! ```
//!
//! Persistence is explicit: callers decide when to [`load`] and
//! [`save`]; nothing is written behind their back.
//!
//! [`load`]: SessionStore::load
//! [`save`]: SessionStore::save

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::SessionError;

/// The client's persisted identity: who is signed in and where.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStore {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    room_id: Option<String>,
}

impl SessionStore {
    /// Creates an empty, signed-out store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful login.
    ///
    /// Any previous identity (including a stale `room_id`) is replaced.
    pub fn begin(
        &mut self,
        session_id: impl Into<String>,
        username: impl Into<String>,
    ) {
        let username = username.into();
        tracing::info!(%username, "session started");
        self.session_id = Some(session_id.into());
        self.username = Some(username);
        self.room_id = None;
    }

    /// Records entry into a match room.
    pub fn enter_room(&mut self, room_id: impl Into<String>) {
        let room_id = room_id.into();
        tracing::debug!(%room_id, "entered room");
        self.room_id = Some(room_id);
    }

    /// Clears the room after a match ends or is abandoned.
    pub fn leave_room(&mut self) {
        if let Some(room_id) = self.room_id.take() {
            tracing::debug!(%room_id, "left room");
        }
    }

    /// Signs out: clears everything.
    pub fn end(&mut self) {
        if let Some(username) = self.username.take() {
            tracing::info!(%username, "session ended");
        }
        self.session_id = None;
        self.room_id = None;
    }

    /// The session token issued at login, if signed in.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// The signed-in player's name, if any.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// The current match room, if any.
    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    /// Whether a login has been recorded.
    pub fn is_authenticated(&self) -> bool {
        self.session_id.is_some()
    }

    /// Whether the player is currently in a match room.
    pub fn in_room(&self) -> bool {
        self.room_id.is_some()
    }

    /// Loads a store from a JSON file.
    ///
    /// A missing file is not an error — it yields a fresh, signed-out
    /// store, exactly like a first run.
    ///
    /// # Errors
    /// - [`SessionError::Io`] if the file exists but can't be read.
    /// - [`SessionError::Corrupt`] if it isn't valid session JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no session file, starting fresh");
                return Ok(Self::default());
            }
            Err(e) => return Err(SessionError::Io(e)),
        };
        let store: Self =
            serde_json::from_str(&text).map_err(SessionError::Corrupt)?;
        tracing::debug!(
            path = %path.display(),
            authenticated = store.is_authenticated(),
            "session loaded"
        );
        Ok(store)
    }

    /// Saves the store to a JSON file, overwriting any previous content.
    ///
    /// # Errors
    /// Returns [`SessionError::Io`] if the write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let path = path.as_ref();
        // Serializing a struct of three optional strings cannot fail.
        let text = serde_json::to_string_pretty(self)
            .expect("session store is always serializable");
        std::fs::write(path, text)?;
        tracing::debug!(path = %path.display(), "session saved");
        Ok(())
    }
}

// =========================================================================
// Tests
// =========================================================================
