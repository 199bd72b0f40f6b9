//! Permission-gated command dispatch.
//!
//! One method per user intent. Each trims and validates its input
//! (empty or whitespace-only text is silently dropped), checks the
//! caller's capability for the active session, and emits exactly one
//! request with the minimal payload. Local collections are never
//! touched here; resulting state changes arrive later through the
//! reconcilers.
//!
//! Invitation creation is the one command whose caller needs the result
//! before it can proceed (closing the modal, showing the toast), so it
//! is request/response; everything else is fire-and-forget.

use crate::connection::Connection;
use crate::error::ClientError;
use crate::store::Store;
use crate::surface::{Notifier, Severity};
use cowrite_protocol::{
    AiTool, Capability, ClientRequest, Invitation, Membership, NotificationStatus, Permission,
};
use std::sync::Arc;
use tracing::debug;

/// Translates user intents into outbound requests.
///
/// Stateless beyond the connection handle and the membership store it
/// reads capabilities from.
pub struct CommandDispatcher {
    conn: Arc<Connection>,
    membership: Store<Option<Membership>>,
    notifier: Arc<dyn Notifier>,
}

impl CommandDispatcher {
    pub fn new(
        conn: Arc<Connection>,
        membership: Store<Option<Membership>>,
        notifier: Arc<dyn Notifier>,
    ) -> Arc<Self> {
        Arc::new(Self {
            conn,
            membership,
            notifier,
        })
    }

    /// Capability of the local user in the active session. No known
    /// membership means no capability at all.
    pub fn capability(&self) -> Capability {
        self.membership
            .get()
            .map(|m| m.permission.capability())
            .unwrap_or_default()
    }

    // ---- documents ----

    pub fn create_document(&self, title: &str) -> Result<(), ClientError> {
        let Some(title) = non_empty(title) else {
            return Ok(());
        };
        if !self.capability().edit {
            return self.blocked("createDocument");
        }
        self.conn.send(ClientRequest::CreateDocument { title })
    }

    pub fn change_document_title(
        &self,
        document_id: i64,
        new_title: &str,
    ) -> Result<(), ClientError> {
        let Some(new_title) = non_empty(new_title) else {
            return Ok(());
        };
        if !self.capability().edit {
            return self.blocked("changeDocumentTitle");
        }
        self.conn.send(ClientRequest::ChangeDocumentTitle {
            document_id,
            new_title,
        })
    }

    /// Persist document content. Content is not trimmed: an empty
    /// document is a legitimate state.
    pub fn change_document_content(
        &self,
        document_id: i64,
        new_content: String,
    ) -> Result<(), ClientError> {
        if !self.capability().edit {
            return self.blocked("changeContentAndSaveDocument");
        }
        self.conn.send(ClientRequest::ChangeContentAndSaveDocument {
            document_id,
            new_content,
        })
    }

    pub fn apply_version(&self, document_id: i64, version_id: i64) -> Result<(), ClientError> {
        if !self.capability().edit {
            return self.blocked("applyVersion");
        }
        self.conn.send(ClientRequest::ApplyVersion {
            document_id,
            version_id,
        })
    }

    pub fn duplicate_document(&self, document_id: i64) -> Result<(), ClientError> {
        if !self.capability().edit {
            return self.blocked("duplicateDocument");
        }
        self.conn
            .send(ClientRequest::DuplicateDocument { document_id })
    }

    pub fn delete_document(&self, document_id: i64) -> Result<(), ClientError> {
        if !self.capability().edit {
            return self.blocked("deleteDocument");
        }
        self.conn.send(ClientRequest::DeleteDocument { document_id })
    }

    // ---- AI tools ----

    /// Emit a tool invocation request. Input validation and in-flight
    /// tracking live in the correlator; this only gates and sends.
    pub fn create_ai_usage(
        &self,
        tool: AiTool,
        text: String,
        document_id: i64,
        target_language: Option<String>,
    ) -> Result<(), ClientError> {
        if !self.capability().edit {
            return self.blocked("createDocumentAiUsage");
        }
        self.conn.send(ClientRequest::CreateDocumentAiUsage {
            tool: tool.wire_name().to_string(),
            text,
            document_id,
            target_language,
        })
    }

    // ---- session administration ----

    pub fn rename_session(&self, session_id: i64, new_name: &str) -> Result<(), ClientError> {
        let Some(new_name) = non_empty(new_name) else {
            return Ok(());
        };
        if !self.capability().admin {
            return self.blocked("updateSessionName");
        }
        self.conn.send(ClientRequest::UpdateSessionName {
            session_id,
            new_name,
        })
    }

    pub fn delete_session(&self, session_id: i64) -> Result<(), ClientError> {
        if !self.capability().admin {
            return self.blocked("deleteSession");
        }
        self.conn.send(ClientRequest::DeleteSession { session_id })
    }

    pub fn change_user_permissions(
        &self,
        user_id: i64,
        permission: Permission,
    ) -> Result<(), ClientError> {
        if !self.capability().admin {
            return self.blocked("changeUserPermissions");
        }
        self.conn.send(ClientRequest::ChangeUserPermissions {
            user_id,
            permission,
        })
    }

    // ---- invitations ----

    /// Create an invitation and wait for the authority's response.
    ///
    /// Resolves with the created invitation (the caller closes its form
    /// on success); the invitation list itself is updated by the
    /// reconciler when the corresponding delta arrives.
    pub async fn create_invitation(
        &self,
        email: &str,
        role: Permission,
        session_id: i64,
    ) -> Result<Invitation, ClientError> {
        let Some(email) = non_empty(email) else {
            self.notifier
                .notify("Enter an email address", Severity::Warning);
            return Err(ClientError::InvalidInput("empty invitation email".into()));
        };
        if !self.capability().edit {
            debug!("dropping createInvitation: caller lacks the required permission");
            return Err(ClientError::InvalidInput("missing edit capability".into()));
        }

        let ack = self
            .conn
            .request(|req| ClientRequest::CreateInvitation {
                req,
                email: email.clone(),
                role,
                session_id,
            })
            .await?;
        let invitation = ack
            .invitation
            .ok_or_else(|| ClientError::MalformedResponse("ack without invitation".into()))?;
        self.notifier
            .notify(&format!("Invitation sent to {}", email), Severity::Success);
        Ok(invitation)
    }

    pub fn change_invitation_role(
        &self,
        invitation_id: i64,
        new_role: Permission,
    ) -> Result<(), ClientError> {
        if !self.capability().edit {
            return self.blocked("changeInvitationRole");
        }
        self.conn.send(ClientRequest::ChangeInvitationRole {
            invitation_id,
            new_role,
        })
    }

    // ---- notifications (dashboard scope, no session capability) ----

    pub fn accept_invitation(&self, invitation_id: i64) -> Result<(), ClientError> {
        self.conn
            .send(ClientRequest::AcceptInvitation { invitation_id })
    }

    pub fn delete_notification(&self, invitation_id: i64) -> Result<(), ClientError> {
        self.conn
            .send(ClientRequest::DeleteNotification { invitation_id })
    }

    pub fn update_notification_status(
        &self,
        invitation_id: i64,
        status: NotificationStatus,
    ) -> Result<(), ClientError> {
        self.conn.send(ClientRequest::UpdateNotificationStatus {
            invitation_id,
            status,
        })
    }

    // ---- chat ----

    /// Any member may chat; empty messages are silently dropped.
    pub fn send_message(&self, text: &str) -> Result<(), ClientError> {
        let Some(message) = non_empty(text) else {
            return Ok(());
        };
        if !self.capability().read {
            return self.blocked("sendMessage");
        }
        self.conn.send(ClientRequest::SendMessage { message })
    }

    fn blocked(&self, command: &str) -> Result<(), ClientError> {
        debug!("dropping {}: caller lacks the required permission", command);
        Ok(())
    }
}

/// Trim input; `None` for empty or whitespace-only strings.
fn non_empty(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_trims() {
        assert_eq!(non_empty("  hello  "), Some("hello".to_string()));
        assert_eq!(non_empty("   "), None);
        assert_eq!(non_empty(""), None);
    }
}
