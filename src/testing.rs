//! Recording fakes and entity builders for tests.
//!
//! The engine's seams (transport, notifier, navigator) get recording
//! implementations here so integration tests can drive the whole stack
//! by dispatching events onto the bus and asserting on captured
//! traffic.

use crate::error::ClientError;
use crate::surface::{Navigator, Notifier, Route, Severity};
use crate::transport::Transport;
use cowrite_protocol::events::TotalSessionData;
use cowrite_protocol::{
    AiToolUsage, ClientRequest, Collaborator, Document, Invitation, InvitationStatus, Membership,
    Message, NotificationStatus, Permission, Session, User, Version,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Captures every request the engine emits.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<ClientRequest>>,
    closed: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured requests, in emission order.
    pub fn sent(&self) -> Vec<ClientRequest> {
        self.sent.lock().expect("sent lock poisoned").clone()
    }

    /// Captured requests with the given wire event name.
    pub fn sent_named(&self, event_name: &str) -> Vec<ClientRequest> {
        self.sent()
            .into_iter()
            .filter(|r| r.event_name() == event_name)
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Transport for RecordingTransport {
    fn send(&self, request: ClientRequest) -> Result<(), ClientError> {
        self.sent.lock().expect("sent lock poisoned").push(request);
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Captures notifications.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(String, Severity)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<(String, Severity)> {
        self.notices.lock().expect("notices lock poisoned").clone()
    }

    pub fn with_severity(&self, severity: Severity) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|(_, s)| *s == severity)
            .map(|(m, _)| m)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.notices
            .lock()
            .expect("notices lock poisoned")
            .push((message.to_string(), severity));
    }
}

/// Captures navigation intents.
#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().expect("routes lock poisoned").clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes
            .lock()
            .expect("routes lock poisoned")
            .push(route);
    }
}

// ---- entity builders ----

pub fn user(id: i64) -> User {
    User {
        id,
        name: format!("user-{}", id),
        email: format!("user-{}@example.com", id),
        avatar: None,
    }
}

pub fn membership(user_id: i64, permission: Permission) -> Membership {
    Membership {
        user: user(user_id),
        permission,
    }
}

pub fn collaborator(id: i64, permission: Permission) -> Collaborator {
    Collaborator {
        id,
        name: format!("user-{}", id),
        avatar: None,
        permission,
    }
}

pub fn session(id: i64, members: Vec<Membership>) -> Session {
    Session {
        id,
        name: format!("session-{}", id),
        users: members,
    }
}

pub fn document(id: i64, session_id: i64, content: &str) -> Document {
    Document {
        id,
        title: format!("doc-{}", id),
        content: content.to_string(),
        session_id,
        created_at: 0,
        updated_at: 0,
    }
}

pub fn version(id: i64, document_id: i64, content: &str) -> Version {
    Version {
        id,
        content: content.to_string(),
        document_id,
        user_id: 1,
        created_at: 0,
    }
}

pub fn invitation(id: i64, session_id: i64, email: &str, role: Permission) -> Invitation {
    Invitation {
        id,
        email: email.to_string(),
        role,
        status: InvitationStatus::Pending,
        notification_status: NotificationStatus::Unread,
        expires_at: u64::MAX,
        inviter: user(1),
        session_id,
        session_name: format!("session-{}", session_id),
    }
}

pub fn message(id: i64, session_id: i64, text: &str) -> Message {
    Message {
        id,
        text: text.to_string(),
        sender: user(1),
        session_id,
        created_at: 0,
    }
}

pub fn usage(id: i64, document_id: i64, session_id: i64, user_id: i64) -> AiToolUsage {
    AiToolUsage {
        id,
        tool: "summarize".to_string(),
        input: "input".to_string(),
        result: "result".to_string(),
        document_id: Some(document_id),
        session_id,
        user_id,
        created_at: 0,
    }
}

/// Snapshot with the given members online and a time baseline.
pub fn total_session_data(
    session_id: i64,
    members: Vec<Membership>,
    time_spent: u64,
) -> TotalSessionData {
    let online = members
        .iter()
        .map(|m| collaborator(m.user.id, m.permission))
        .collect();
    TotalSessionData {
        session: session(session_id, members),
        online_users: online,
        time_spent,
    }
}
