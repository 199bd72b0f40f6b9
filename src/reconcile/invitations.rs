//! Invitation and notification reconciliation.
//!
//! The same entity backs two views: a session's invitation management
//! list (scoped by session id) and the signed-in user's dashboard
//! notifications (scoped by the connection's dashboard join). Both fold
//! the same delta events; only the snapshot event and the parent filter
//! differ.
//!
//! The list refresh is one of the two callback-style operations in the
//! protocol: the caller needs confirmation of completion, so `refresh`
//! resolves once the authority acks with the refreshed list.

use crate::bus::SubscriptionGuard;
use crate::connection::Connection;
use crate::error::ClientError;
use crate::reconcile::{remove, upsert, InsertAt};
use crate::store::Store;
use cowrite_protocol::{ClientRequest, EventKind, Invitation, ServerEvent};
use std::sync::Arc;

/// Which invitation collection this reconciler maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationScope {
    /// A session's outstanding invitations (session view).
    Session(i64),
    /// The signed-in user's notifications (dashboard view).
    Notifications,
}

/// Reconciled invitation collection for one scope.
pub struct InvitationReconciler {
    scope: InvitationScope,
    conn: Arc<Connection>,
    invitations: Store<Vec<Invitation>>,
    _subs: Vec<SubscriptionGuard>,
}

impl InvitationReconciler {
    /// Mount the session-scoped invitation list.
    pub fn mount_session(conn: &Arc<Connection>) -> Result<Arc<Self>, ClientError> {
        let session_id = conn
            .session_id()
            .ok_or_else(|| ClientError::InvalidInput("invitation list needs a session scope".into()))?;
        Self::mount(conn, InvitationScope::Session(session_id))
    }

    /// Mount the dashboard notification list.
    pub fn mount_notifications(conn: &Arc<Connection>) -> Result<Arc<Self>, ClientError> {
        Self::mount(conn, InvitationScope::Notifications)
    }

    fn mount(conn: &Arc<Connection>, scope: InvitationScope) -> Result<Arc<Self>, ClientError> {
        // Initial fetch, uncorrelated: the list arrives as a snapshot
        // broadcast, so the mount does not wait on an ack.
        conn.send(Self::fetch_request(scope, None))?;

        let invitations: Store<Vec<Invitation>> = Store::default();
        let bus = conn.bus();
        let mut subs = Vec::new();

        let snapshot_kind = match scope {
            InvitationScope::Session(_) => EventKind::Invitations,
            InvitationScope::Notifications => EventKind::Notifications,
        };
        let store = invitations.clone();
        subs.push(bus.subscribe(snapshot_kind, move |event| {
            let (ServerEvent::Invitations(list) | ServerEvent::Notifications(list)) = event else {
                return;
            };
            store.set(Self::filtered(scope, list));
        }));

        for kind in [
            EventKind::NewInvitation,
            EventKind::InvitationUpdated,
            EventKind::NotificationUpdated,
            EventKind::InvitationAccepted,
        ] {
            let store = invitations.clone();
            subs.push(bus.subscribe(kind, move |event| {
                let (ServerEvent::NewInvitation(invitation)
                | ServerEvent::InvitationUpdated(invitation)
                | ServerEvent::NotificationUpdated(invitation)
                | ServerEvent::InvitationAccepted(invitation)) = event
                else {
                    return;
                };
                if !Self::in_scope(scope, invitation) {
                    return;
                }
                store.update(|items| upsert(items, invitation.clone(), InsertAt::Head));
            }));
        }

        let store = invitations.clone();
        subs.push(bus.subscribe(EventKind::NotificationDeleted, move |event| {
            if let ServerEvent::NotificationDeleted(deleted) = event {
                store.update(|items| {
                    remove(items, deleted.invitation_id);
                });
            }
        }));

        Ok(Arc::new(Self {
            scope,
            conn: conn.clone(),
            invitations,
            _subs: subs,
        }))
    }

    /// Re-fetch the list and resolve once the authority confirms.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let scope = self.scope;
        let ack = self
            .conn
            .request(|req| Self::fetch_request(scope, Some(req)))
            .await?;
        let list = ack
            .invitations
            .ok_or_else(|| ClientError::MalformedResponse("ack without invitation list".into()))?;
        self.invitations.set(Self::filtered(scope, &list));
        Ok(())
    }

    pub fn scope(&self) -> InvitationScope {
        self.scope
    }

    /// The reconciled collection, newest-first.
    pub fn invitations(&self) -> &Store<Vec<Invitation>> {
        &self.invitations
    }

    fn fetch_request(scope: InvitationScope, req: Option<String>) -> ClientRequest {
        match scope {
            InvitationScope::Session(_) => ClientRequest::GetInvitations { req },
            InvitationScope::Notifications => ClientRequest::GetNotifications { req },
        }
    }

    fn in_scope(scope: InvitationScope, invitation: &Invitation) -> bool {
        match scope {
            InvitationScope::Session(session_id) => invitation.session_id == session_id,
            // Dashboard deltas are already targeted at the signed-in
            // user by the authority.
            InvitationScope::Notifications => true,
        }
    }

    fn filtered(scope: InvitationScope, list: &[Invitation]) -> Vec<Invitation> {
        list.iter()
            .filter(|i| Self::in_scope(scope, i))
            .cloned()
            .collect()
    }
}
