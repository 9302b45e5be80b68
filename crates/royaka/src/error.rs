//! Unified error types for the client hub.

use royaka_protocol::ProtocolError;
use royaka_transport::TransportError;

/// Top-level error that wraps the layer-specific errors.
///
/// The hub itself never throws these outward — transport and decode
/// failures resolve into the connection state and log lines — but
/// application code composing the sub-crates gets a single error type
/// to bubble with `?`.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A transport-level error (dial, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A correlation-helper error (timeout, not connected).
    #[error(transparent)]
    Request(#[from] RequestError),
}

/// Errors from the request/response correlation helper.
///
/// These never escape [`Client::subscribe`](crate::Client::subscribe)
/// fan-out — only [`Client::request`](crate::Client::request) and
/// [`Client::wait_for`](crate::Client::wait_for) return them.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The client isn't connected; the request was not sent.
    #[error("not connected to server")]
    NotConnected,

    /// The request kind has no reply kind to wait for
    /// (e.g. `find_match`, whose results arrive as unsolicited pushes).
    #[error("'{kind}' has no direct reply")]
    NoReply { kind: String },

    /// No matching reply arrived within the deadline.
    #[error("timed out waiting for '{kind}'")]
    Timeout { kind: String },

    /// The client was torn down while waiting.
    #[error("client stopped while waiting for '{kind}'")]
    Stopped { kind: String },
}
