//! Connection lifecycle management.
//!
//! One [`Connection`] per mounted top-level view context (the dashboard
//! or a specific session). It owns the join/leave handshake, routes
//! `ack` responses to pending callback-style requests, and handles the
//! generic signals every connection subscribes to for its lifetime:
//! domain errors (transient notification), `sessionDeleted` (eviction),
//! and `invalidSession`. Transport-level errors are logged inside the
//! transport itself and are non-fatal.
//!
//! No entity state is mutated here; visible side effects are limited to
//! emitted requests, notifications, and a single redirect intent.

use crate::bus::{EventBus, SubscriptionGuard};
use crate::error::ClientError;
use crate::store::Store;
use crate::surface::{Navigator, Notifier, Route, Severity};
use crate::transport::Transport;
use cowrite_protocol::events::Ack;
use cowrite_protocol::{ClientRequest, EventKind, ServerEvent, User};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// How long a callback-style command waits for its `ack`.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// The view context a connection is opened for, as handed over by the
/// router. A session id arrives as the raw route parameter and is
/// validated before any join request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewContext {
    Dashboard,
    Session { session_id: String },
}

/// Validated scope of an open connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewScope {
    Dashboard,
    Session { session_id: i64 },
}

type PendingAcks = Arc<Mutex<HashMap<String, oneshot::Sender<Ack>>>>;

/// An open connection to the authority for one view context.
pub struct Connection {
    transport: Arc<dyn Transport>,
    bus: EventBus,
    scope: ViewScope,
    identity: Store<Option<User>>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    pending: PendingAcks,
    request_timeout: Duration,
    shut_down: AtomicBool,
    subs: Mutex<Vec<SubscriptionGuard>>,
}

impl Connection {
    /// Open a connection for `context`.
    ///
    /// A session context must carry a positive integer id; otherwise a
    /// user-visible error is emitted, a redirect to the dashboard is
    /// requested, and no join request is ever sent. On success exactly
    /// one join request appropriate to the context is emitted.
    pub fn open(
        context: ViewContext,
        transport: Arc<dyn Transport>,
        bus: EventBus,
        identity: Store<Option<User>>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        request_timeout: Duration,
    ) -> Result<Arc<Self>, ClientError> {
        let scope = match &context {
            ViewContext::Dashboard => ViewScope::Dashboard,
            ViewContext::Session { session_id } => match session_id.trim().parse::<i64>() {
                Ok(id) if id > 0 => ViewScope::Session { session_id: id },
                _ => {
                    warn!("rejected session context with id {:?}", session_id);
                    notifier.notify("This session does not exist", Severity::Error);
                    navigator.navigate(Route::Dashboard);
                    return Err(ClientError::InvalidSessionId(session_id.clone()));
                }
            },
        };

        let conn = Arc::new(Self {
            transport,
            bus,
            scope,
            identity,
            notifier,
            navigator,
            pending: Arc::new(Mutex::new(HashMap::new())),
            request_timeout,
            shut_down: AtomicBool::new(false),
            subs: Mutex::new(Vec::new()),
        });
        Self::install_signal_handlers(&conn);

        match scope {
            ViewScope::Dashboard => conn.send(ClientRequest::JoinDashboard)?,
            ViewScope::Session { session_id } => {
                conn.send(ClientRequest::JoinSession { session_id })?
            }
        }
        Ok(conn)
    }

    /// The validated scope this connection was opened for.
    pub fn scope(&self) -> ViewScope {
        self.scope
    }

    /// Session id for session-scoped connections.
    pub fn session_id(&self) -> Option<i64> {
        match self.scope {
            ViewScope::Session { session_id } => Some(session_id),
            ViewScope::Dashboard => None,
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Emit a fire-and-forget request.
    pub fn send(&self, request: ClientRequest) -> Result<(), ClientError> {
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(ClientError::ConnectionClosed);
        }
        trace!("dispatching {}", request.event_name());
        self.transport.send(request)
    }

    /// Emit a callback-style request and wait for its `ack`.
    ///
    /// `make` receives the generated correlation id and builds the
    /// request carrying it. Resolves or rejects exactly once; a missing
    /// response fails with [`ClientError::Timeout`].
    pub async fn request(
        &self,
        make: impl FnOnce(String) -> ClientRequest,
    ) -> Result<Ack, ClientError> {
        let req_id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .expect("pending lock poisoned")
            .insert(req_id.clone(), tx);

        if let Err(e) = self.send(make(req_id.clone())) {
            self.pending
                .lock()
                .expect("pending lock poisoned")
                .remove(&req_id);
            return Err(e);
        }

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(mut ack)) => match ack.error.take() {
                Some(message) => Err(ClientError::Rejected(message)),
                None => Ok(ack),
            },
            Ok(Err(_)) => Err(ClientError::ConnectionClosed),
            Err(_) => {
                self.pending
                    .lock()
                    .expect("pending lock poisoned")
                    .remove(&req_id);
                Err(ClientError::Timeout)
            }
        }
    }

    /// Tear the connection down: drop this connection's own
    /// subscriptions, emit a leave request (session scope only), then
    /// terminate the low-level connection. Idempotent.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!(scope = ?self.scope, "connection shutting down");
        self.subs.lock().expect("subs lock poisoned").clear();
        // Pending callers resolve with ConnectionClosed when their
        // senders drop.
        self.pending.lock().expect("pending lock poisoned").clear();
        if let ViewScope::Session { .. } = self.scope {
            let _ = self.transport.send(ClientRequest::LeaveSession);
        }
        self.transport.close();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    fn install_signal_handlers(conn: &Arc<Self>) {
        let mut subs = Vec::new();

        // ack router: correlate responses back to waiting callers.
        let pending = conn.pending.clone();
        subs.push(conn.bus.subscribe(EventKind::Ack, move |event| {
            if let ServerEvent::Ack(ack) = event {
                let sender = pending
                    .lock()
                    .expect("pending lock poisoned")
                    .remove(&ack.req);
                match sender {
                    Some(tx) => {
                        let _ = tx.send(ack.clone());
                    }
                    None => trace!("no pending request for ack req={}", ack.req),
                }
            }
        }));

        // Domain errors: transient notification, nothing else.
        let notifier = conn.notifier.clone();
        subs.push(conn.bus.subscribe(EventKind::Error, move |event| {
            if let ServerEvent::Error(e) = event {
                warn!("server error: {}", e.message);
                notifier.notify(&e.message, Severity::Error);
            }
        }));

        // Eviction: the session was deleted under us. Message severity
        // depends on whether the local user was the actor.
        let weak = Arc::downgrade(conn);
        subs.push(
            conn.bus
                .subscribe(EventKind::SessionDeleted, move |event| {
                    if let ServerEvent::SessionDeleted(deleted) = event {
                        let Some(conn) = weak.upgrade() else { return };
                        let own = conn
                            .identity
                            .get()
                            .map(|user| user.id == deleted.user_id)
                            .unwrap_or(false);
                        let severity = if own {
                            Severity::Success
                        } else {
                            Severity::Warning
                        };
                        conn.notifier.notify(&deleted.message, severity);
                        conn.shutdown();
                        conn.navigator.navigate(Route::Dashboard);
                    }
                }),
        );

        // Invalid session: same teardown, always an error.
        let weak = Arc::downgrade(conn);
        subs.push(
            conn.bus
                .subscribe(EventKind::InvalidSession, move |event| {
                    if let ServerEvent::InvalidSession(invalid) = event {
                        let Some(conn) = weak.upgrade() else { return };
                        let message = if invalid.message.is_empty() {
                            "This session does not exist"
                        } else {
                            &invalid.message
                        };
                        conn.notifier.notify(message, Severity::Error);
                        conn.shutdown();
                        conn.navigator.navigate(Route::Dashboard);
                    }
                }),
        );

        *conn.subs.lock().expect("subs lock poisoned") = subs;
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.shutdown();
    }
}
