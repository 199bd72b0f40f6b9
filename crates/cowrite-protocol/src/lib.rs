//! Shared protocol types for the Cowrite client.
//!
//! The client talks to the session authority over one bidirectional
//! connection per mounted view. Every frame is a JSON envelope
//! `{"event": "<name>", "data": {...}}`; this crate defines the typed
//! form of both directions:
//!
//! - [`ClientRequest`]: outbound commands (join/leave, fetches, mutations)
//! - [`ServerEvent`]: inbound snapshots, deltas, and generic signals
//!
//! plus the domain entities those payloads carry and the permission
//! model used to gate outbound mutations.

pub mod events;
pub mod model;
pub mod permission;
pub mod requests;

pub use events::{Ack, EventKind, ServerEvent, TotalSessionData};
pub use model::{
    AiTool, AiToolUsage, Collaborator, Document, Invitation, InvitationStatus, Membership,
    Message, NotificationStatus, Session, User, Version,
};
pub use permission::{Capability, Permission};
pub use requests::ClientRequest;
