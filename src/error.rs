//! Unified error type for the client engine.
//!
//! Failures never cross component boundaries as panics; they resolve
//! into a notification, a redirect, or a `Result` on the few
//! request/response commands.

use thiserror::Error;

/// Errors surfaced by the sync engine.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The session id in the view context is not a positive integer.
    #[error("invalid session id: {0:?}")]
    InvalidSessionId(String),

    /// Input rejected client-side before any request was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The underlying transport refused or dropped the request.
    #[error("transport error: {0}")]
    Transport(String),

    /// The connection was shut down before or during the operation.
    #[error("connection closed")]
    ConnectionClosed,

    /// A callback-style command received no response in time.
    #[error("request timed out")]
    Timeout,

    /// The authority rejected a callback-style command.
    #[error("rejected by server: {0}")]
    Rejected(String),

    /// The response to a callback-style command was missing its payload.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Wire encoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
