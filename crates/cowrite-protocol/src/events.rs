//! Inbound events pushed by the session authority.
//!
//! The stream is broadcast-style, unordered, and at-least-once: a view
//! may see snapshots and deltas for parents it is not scoped to, and the
//! same delta twice. Reconcilers are responsible for filtering by parent
//! id and for replace-or-insert idempotence; nothing here deduplicates.
//!
//! Callback-style commands are answered with an [`Ack`] carrying the
//! request's `req` correlation id; everything else arrives uncorrelated.

use crate::model::{AiToolUsage, Collaborator, Document, Invitation, Message, Session, Version};
use crate::permission::Permission;
use serde::{Deserialize, Serialize};

/// Full session snapshot sent after a successful join (and on request).
///
/// `time_spent` is the server-side elapsed-seconds baseline for the
/// session timer; the client interpolates between snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalSessionData {
    pub session: Session,
    pub online_users: Vec<Collaborator>,
    pub time_spent: u64,
}

/// Removal notice for a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDeleted {
    pub document_id: i64,
    pub session_id: i64,
}

/// Removal notice for an invitation/notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDeleted {
    pub invitation_id: i64,
}

/// A collaborator left the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLeft {
    pub user_id: i64,
}

/// A member's permission was replaced by the authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsChanged {
    pub user_id: i64,
    pub permission: Permission,
}

/// Forced eviction: the session was deleted while clients were joined.
/// `user_id` identifies the actor who deleted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDeleted {
    pub message: String,
    pub user_id: i64,
}

/// The requested session does not exist or is not joinable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidSession {
    #[serde(default)]
    pub message: String,
}

/// Generic domain error from the authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEvent {
    pub message: String,
}

/// Response to a callback-style command, correlated by `req`.
///
/// Exactly one of the payload fields is populated on success, depending
/// on the command; `error` is set instead when the command was rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    pub req: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitation: Option<Invitation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitations: Option<Vec<Invitation>>,
}

/// Every event the authority pushes to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    // Snapshots. Array payloads may be broader than the scoped parent;
    // each record carries its own parent id for client-side filtering.
    TotalSessionData(TotalSessionData),
    SessionDocuments(Vec<Document>),
    VersionsData(Vec<Version>),
    DocumentAiUsage(Vec<AiToolUsage>),
    Invitations(Vec<Invitation>),
    Notifications(Vec<Invitation>),
    Messages(Vec<Message>),

    // Document deltas.
    DocumentCreated(Document),
    DocumentUpdated(Document),
    DocumentDuplicated(Document),
    DocumentDeleted(DocumentDeleted),
    LastEditedDocument(Document),

    // Version deltas.
    VersionCreated(Version),

    // AI tool usage deltas.
    DocumentAiUsageCreated(AiToolUsage),

    // Invitation deltas.
    NewInvitation(Invitation),
    InvitationUpdated(Invitation),
    NotificationUpdated(Invitation),
    NotificationDeleted(NotificationDeleted),
    InvitationAccepted(Invitation),

    // Chat deltas.
    NewMessage(Message),

    // Presence deltas.
    NewOnlineUser(Collaborator),
    UserLeft(UserLeft),
    PermissionsChanged(PermissionsChanged),

    // Generic signals.
    SessionDeleted(SessionDeleted),
    InvalidSession(InvalidSession),
    Ack(Ack),
    Error(ErrorEvent),
}

/// Discriminant of a [`ServerEvent`], used as the dispatch-table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TotalSessionData,
    SessionDocuments,
    VersionsData,
    DocumentAiUsage,
    Invitations,
    Notifications,
    Messages,
    DocumentCreated,
    DocumentUpdated,
    DocumentDuplicated,
    DocumentDeleted,
    LastEditedDocument,
    VersionCreated,
    DocumentAiUsageCreated,
    NewInvitation,
    InvitationUpdated,
    NotificationUpdated,
    NotificationDeleted,
    InvitationAccepted,
    NewMessage,
    NewOnlineUser,
    UserLeft,
    PermissionsChanged,
    SessionDeleted,
    InvalidSession,
    Ack,
    Error,
}

impl ServerEvent {
    /// The dispatch-table key for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            ServerEvent::TotalSessionData(_) => EventKind::TotalSessionData,
            ServerEvent::SessionDocuments(_) => EventKind::SessionDocuments,
            ServerEvent::VersionsData(_) => EventKind::VersionsData,
            ServerEvent::DocumentAiUsage(_) => EventKind::DocumentAiUsage,
            ServerEvent::Invitations(_) => EventKind::Invitations,
            ServerEvent::Notifications(_) => EventKind::Notifications,
            ServerEvent::Messages(_) => EventKind::Messages,
            ServerEvent::DocumentCreated(_) => EventKind::DocumentCreated,
            ServerEvent::DocumentUpdated(_) => EventKind::DocumentUpdated,
            ServerEvent::DocumentDuplicated(_) => EventKind::DocumentDuplicated,
            ServerEvent::DocumentDeleted(_) => EventKind::DocumentDeleted,
            ServerEvent::LastEditedDocument(_) => EventKind::LastEditedDocument,
            ServerEvent::VersionCreated(_) => EventKind::VersionCreated,
            ServerEvent::DocumentAiUsageCreated(_) => EventKind::DocumentAiUsageCreated,
            ServerEvent::NewInvitation(_) => EventKind::NewInvitation,
            ServerEvent::InvitationUpdated(_) => EventKind::InvitationUpdated,
            ServerEvent::NotificationUpdated(_) => EventKind::NotificationUpdated,
            ServerEvent::NotificationDeleted(_) => EventKind::NotificationDeleted,
            ServerEvent::InvitationAccepted(_) => EventKind::InvitationAccepted,
            ServerEvent::NewMessage(_) => EventKind::NewMessage,
            ServerEvent::NewOnlineUser(_) => EventKind::NewOnlineUser,
            ServerEvent::UserLeft(_) => EventKind::UserLeft,
            ServerEvent::PermissionsChanged(_) => EventKind::PermissionsChanged,
            ServerEvent::SessionDeleted(_) => EventKind::SessionDeleted,
            ServerEvent::InvalidSession(_) => EventKind::InvalidSession,
            ServerEvent::Ack(_) => EventKind::Ack,
            ServerEvent::Error(_) => EventKind::Error,
        }
    }
}
