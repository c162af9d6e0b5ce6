//! Client-specific error types.
//!
//! Write failures inside the writer thread are logged rather than returned;
//! [`ClientError`] is surfaced by construction and by the actor's internal
//! write routines.

use thiserror::Error;

/// Errors that can occur in the time-series client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP transport failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server rejected the write.
    #[error("write rejected with status {status}: {body}")]
    Status { status: u16, body: String },

    /// Failed to send command to writer actor.
    #[error("failed to send command to writer actor")]
    ChannelSend,

    /// Client has been closed.
    #[error("client is closed")]
    Closed,

    /// Point cannot be encoded as line protocol.
    #[error("encode error: {0}")]
    Encode(String),

    /// Internal error (e.g., thread spawn or join failure).
    #[error("internal error: {0}")]
    Internal(String),
}
