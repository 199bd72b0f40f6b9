//! Outbound transport seam.
//!
//! The engine never talks to a socket directly; it hands
//! [`ClientRequest`]s to a [`Transport`]. Production uses the WebSocket
//! implementation in [`ws`]; tests use the recording fake in
//! [`crate::testing`].

pub mod ws;

use crate::error::ClientError;
use cowrite_protocol::ClientRequest;

/// One persistent bidirectional connection's outbound half.
///
/// `send` is fire-and-forget: it enqueues the request and returns; any
/// response arrives later through the event bus. Transport-level
/// failures (disconnects, refused writes) are logged by the
/// implementation and are non-fatal — reconnection is the transport's
/// own responsibility.
pub trait Transport: Send + Sync {
    fn send(&self, request: ClientRequest) -> Result<(), ClientError>;

    /// Terminate the low-level connection. Idempotent.
    fn close(&self);
}
