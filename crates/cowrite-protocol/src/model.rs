//! Domain entities carried by protocol payloads.
//!
//! These are read-projections of server-side state; the client never
//! constructs authoritative versions of them. Timestamps are epoch
//! milliseconds throughout.

use crate::permission::Permission;
use serde::{Deserialize, Serialize};

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// A user's membership in a session, with their current permission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub user: User,
    pub permission: Permission,
}

/// A collaborative session: the top-level container for documents,
/// chat, and invitations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: i64,
    pub name: String,
    pub users: Vec<Membership>,
}

/// A document inside a session. `content` is the serialized editor
/// representation, opaque to the sync engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub session_id: i64,
    pub created_at: u64,
    pub updated_at: u64,
}

/// An immutable content snapshot of a document, created by the
/// authority on every committed content change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: i64,
    pub content: String,
    pub document_id: i64,
    pub user_id: i64,
    pub created_at: u64,
}

/// Acceptance state of an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
}

/// Read state of the notification surfaced for an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Unread,
    Read,
}

/// An invitation into a session, doubling as the invitee's dashboard
/// notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: i64,
    pub email: String,
    pub role: Permission,
    pub status: InvitationStatus,
    pub notification_status: NotificationStatus,
    pub expires_at: u64,
    pub inviter: User,
    pub session_id: i64,
    pub session_name: String,
}

/// A presence entry: a collaborator currently online in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collaborator {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub permission: Permission,
}

/// A chat message. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub text: String,
    pub sender: User,
    pub session_id: i64,
    pub created_at: u64,
}

/// A completed AI tool invocation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiToolUsage {
    pub id: i64,
    pub tool: String,
    pub input: String,
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<i64>,
    pub session_id: i64,
    pub user_id: i64,
    pub created_at: u64,
}

/// The AI tools the client can invoke on a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AiTool {
    Summarize,
    Paraphrase,
    CheckGrammar,
    Translate,
}

impl AiTool {
    /// Name of the tool on the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            AiTool::Summarize => "summarize",
            AiTool::Paraphrase => "paraphrase",
            AiTool::CheckGrammar => "checkGrammar",
            AiTool::Translate => "translate",
        }
    }

    /// Whether an invocation must carry a target language.
    pub fn requires_target_language(self) -> bool {
        matches!(self, AiTool::Translate)
    }
}
