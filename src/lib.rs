//! Cowrite client: the session synchronization engine.
//!
//! Multiple participants view and edit shared sessions concurrently;
//! state changes happen on a remote authority and are pushed to every
//! connected client over one persistent bidirectional connection per
//! mounted view. This crate reconciles that unordered, at-least-once
//! event stream into consistent local view-state, gates outbound
//! mutations by the caller's permission, and coordinates the timers and
//! debounced writers that share entities with the inbound stream.
//!
//! Structure, leaves first:
//!
//! - [`store`]: narrowly-scoped reactive values
//! - [`bus`]: typed event dispatch with RAII subscriptions
//! - [`transport`]: the outbound seam and its WebSocket implementation
//! - [`connection`]: lifecycle, join/leave, ack correlation, generic
//!   signals
//! - [`reconcile`]: per-family snapshot/upsert/removal folding
//! - [`dispatch`]: permission-gated command emission
//! - [`presence`], [`autosave`], [`ai_tools`]: the timer-driven and
//!   correlated workflows
//! - [`client`]: view composition roots
//!
//! Rendering, routing, and form handling stay outside; see [`surface`]
//! for the traits they plug into.

pub mod ai_tools;
pub mod autosave;
pub mod bus;
pub mod client;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod presence;
pub mod reconcile;
pub mod store;
pub mod surface;
pub mod testing;
pub mod transport;

pub use cowrite_protocol as protocol;

pub use client::{ClientConfig, DashboardClient, DocumentView, SessionClient};
pub use error::ClientError;
