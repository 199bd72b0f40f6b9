//! Outbound requests from the client to the session authority.
//!
//! Requests carry the minimal payload (ids plus changed fields); the
//! resulting state change arrives later as a [`ServerEvent`], never as a
//! direct response — except for the callback-style commands
//! (`createInvitation`, `getInvitations`, `getNotifications`), which
//! carry a `req` correlation id answered by an `ack` event.
//!
//! [`ServerEvent`]: crate::events::ServerEvent

use crate::model::NotificationStatus;
use crate::permission::Permission;
use serde::{Deserialize, Serialize};

/// Every command the client can send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientRequest {
    // Connection lifecycle.
    JoinDashboard,
    JoinSession { session_id: i64 },
    LeaveSession,

    // Fetches. The joined session is implicit where no id is given.
    GetSessionData { session_id: i64 },
    GetDocument { document_id: i64 },
    GetVersions { document_id: i64 },
    GetDocumentAiUsage { document_id: i64 },
    GetSessionDocuments { session_id: i64 },
    GetNotifications {
        #[serde(skip_serializing_if = "Option::is_none")]
        req: Option<String>,
    },
    GetInvitations {
        #[serde(skip_serializing_if = "Option::is_none")]
        req: Option<String>,
    },
    GetMessages,

    // Document mutations.
    CreateDocument { title: String },
    ChangeDocumentTitle { document_id: i64, new_title: String },
    ChangeContentAndSaveDocument { document_id: i64, new_content: String },
    ApplyVersion { document_id: i64, version_id: i64 },
    DuplicateDocument { document_id: i64 },
    DeleteDocument { document_id: i64 },

    // AI tool invocation.
    CreateDocumentAiUsage {
        tool: String,
        text: String,
        document_id: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        target_language: Option<String>,
    },

    // Session administration.
    UpdateSessionName { session_id: i64, new_name: String },
    DeleteSession { session_id: i64 },
    ChangeUserPermissions { user_id: i64, permission: Permission },

    // Invitations and notifications.
    CreateInvitation {
        req: String,
        email: String,
        role: Permission,
        session_id: i64,
    },
    ChangeInvitationRole { invitation_id: i64, new_role: Permission },
    DeleteNotification { invitation_id: i64 },
    AcceptInvitation { invitation_id: i64 },
    UpdateNotificationStatus {
        invitation_id: i64,
        status: NotificationStatus,
    },

    // Chat.
    SendMessage { message: String },
}

impl ClientRequest {
    /// The event name this request serializes under. Useful for logging
    /// and for asserting on captured traffic in tests.
    pub fn event_name(&self) -> &'static str {
        match self {
            ClientRequest::JoinDashboard => "joinDashboard",
            ClientRequest::JoinSession { .. } => "joinSession",
            ClientRequest::LeaveSession => "leaveSession",
            ClientRequest::GetSessionData { .. } => "getSessionData",
            ClientRequest::GetDocument { .. } => "getDocument",
            ClientRequest::GetVersions { .. } => "getVersions",
            ClientRequest::GetDocumentAiUsage { .. } => "getDocumentAiUsage",
            ClientRequest::GetSessionDocuments { .. } => "getSessionDocuments",
            ClientRequest::GetNotifications { .. } => "getNotifications",
            ClientRequest::GetInvitations { .. } => "getInvitations",
            ClientRequest::GetMessages => "getMessages",
            ClientRequest::CreateDocument { .. } => "createDocument",
            ClientRequest::ChangeDocumentTitle { .. } => "changeDocumentTitle",
            ClientRequest::ChangeContentAndSaveDocument { .. } => "changeContentAndSaveDocument",
            ClientRequest::ApplyVersion { .. } => "applyVersion",
            ClientRequest::DuplicateDocument { .. } => "duplicateDocument",
            ClientRequest::DeleteDocument { .. } => "deleteDocument",
            ClientRequest::CreateDocumentAiUsage { .. } => "createDocumentAiUsage",
            ClientRequest::UpdateSessionName { .. } => "updateSessionName",
            ClientRequest::DeleteSession { .. } => "deleteSession",
            ClientRequest::ChangeUserPermissions { .. } => "changeUserPermissions",
            ClientRequest::CreateInvitation { .. } => "createInvitation",
            ClientRequest::ChangeInvitationRole { .. } => "changeInvitationRole",
            ClientRequest::DeleteNotification { .. } => "deleteNotification",
            ClientRequest::AcceptInvitation { .. } => "acceptInvitation",
            ClientRequest::UpdateNotificationStatus { .. } => "updateNotificationStatus",
            ClientRequest::SendMessage { .. } => "sendMessage",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_envelope_shape() {
        let request = ClientRequest::JoinSession { session_id: 12 };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"event":"joinSession","data":{"sessionId":12}}"#);
    }

    #[test]
    fn unit_request_omits_data() {
        let json = serde_json::to_string(&ClientRequest::JoinDashboard).unwrap();
        assert_eq!(json, r#"{"event":"joinDashboard"}"#);
        let back: ClientRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ClientRequest::JoinDashboard);
    }

    #[test]
    fn target_language_omitted_when_absent() {
        let request = ClientRequest::CreateDocumentAiUsage {
            tool: "summarize".into(),
            text: "hello".into(),
            document_id: 3,
            target_language: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("targetLanguage"));
    }

    #[test]
    fn event_name_matches_serialized_tag() {
        let request = ClientRequest::DeleteDocument { document_id: 1 };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(&format!("\"event\":\"{}\"", request.event_name())));
    }
}
