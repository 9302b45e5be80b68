//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A codec converts between Rust types and the wire's raw text frames.
//! The rest of the stack doesn't care HOW messages are serialized — it
//! just needs something that implements the [`Codec`] trait, so a
//! different format can be swapped in without touching the connection
//! manager or dispatch code.
//!
//! The Royaka server speaks JSON over WebSocket text frames, so
//! [`JsonCodec`] is the only implementation provided.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to text frames and decode them back.
///
/// `Send + Sync + 'static` because the codec is stored inside the
/// connection manager's long-lived Tokio task.
///
/// Decode failures are values, never panics: a malformed inbound frame
/// must not be able to take down the dispatch loop.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a text frame.
    ///
    /// No validation is performed beyond what serialization itself
    /// requires; callers are trusted to build well-formed messages.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T)
        -> Result<String, ProtocolError>;

    /// Deserializes a text frame back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the frame is not valid JSON
    /// or doesn't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        text: &str,
    ) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use royaka_protocol::{kind, Codec, Envelope, JsonCodec, LoginRequest};
///
/// let codec = JsonCodec;
///
/// let envelope = Envelope::request(kind::LOGIN, &LoginRequest {
///     username: "alice".into(),
///     password: "hunter2".into(),
/// }).unwrap();
///
/// let text = codec.encode(&envelope).unwrap();
/// let decoded: Envelope = codec.decode(&text).unwrap();
/// assert_eq!(envelope, decoded);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        text: &str,
    ) -> Result<T, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}
