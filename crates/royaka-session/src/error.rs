//! Error types for the session layer.

/// Errors that can occur loading or saving the session file.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Reading or writing the session file failed.
    #[error("session file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The session file exists but isn't valid session JSON.
    #[error("session file is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),
}
