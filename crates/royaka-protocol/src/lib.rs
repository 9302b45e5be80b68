//! Wire protocol for the Royaka client.
//!
//! This crate defines the "language" spoken over the game server's
//! WebSocket endpoint:
//!
//! - **Types** ([`Envelope`], the [`kind`] vocabulary, typed request
//!   payloads) — the message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages
//!   are converted to/from text frames.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw text frames) and the
//! connection manager (lifecycle, dispatch). It doesn't know about
//! sockets or subscribers — it only knows how to serialize and
//! deserialize messages.
//!
//! ```text
//! Transport (text frame) → Protocol (Envelope) → Hub (fan-out to subscribers)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    kind, reply_kind, AttackRequest, Envelope, FindMatchRequest,
    GameRequest, HealRequest, LeaveGameRequest, LoginData, LoginRequest,
    MatchFoundData, MatchMode, PlayAgainRequest, RegisterRequest,
    SelectTroopRequest, SkipTurnRequest, UserRequest,
};
