//! Presence and session timer.
//!
//! The `totalSessionData` snapshot is the authorization checkpoint for
//! the session view: the caller's own membership must appear in the
//! session entity, or the view is denied and redirected. On an accepted
//! snapshot the service captures the server's elapsed-seconds baseline
//! and interpolates display time locally at one-second ticks; every new
//! snapshot replaces the timer task outright, so no extrapolation error
//! accumulates across baselines.
//!
//! Presence deltas patch the online list without touching the timer.
//! The online set is server-authoritative: entries are never invented
//! or aged out locally.

use crate::bus::SubscriptionGuard;
use crate::connection::Connection;
use crate::error::ClientError;
use crate::reconcile::{remove, upsert, InsertAt};
use crate::store::Store;
use cowrite_protocol::{
    ClientRequest, Collaborator, EventKind, Membership, ServerEvent, Session, User,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::debug;

use crate::surface::{Navigator, Notifier, Route, Severity};

/// Presence state and the interpolated session timer for one session
/// view.
pub struct PresenceService {
    session: Store<Option<Session>>,
    online: Store<Vec<Collaborator>>,
    membership: Store<Option<Membership>>,
    elapsed_ms: Store<u64>,
    timer: Arc<Mutex<Option<JoinHandle<()>>>>,
    _subs: Vec<SubscriptionGuard>,
}

impl PresenceService {
    /// Mount on a session-scoped connection. `membership` is shared
    /// with the dispatcher and autosave, which read capabilities from
    /// it; this service is its writer.
    pub fn mount(
        conn: &Arc<Connection>,
        identity: Store<Option<User>>,
        membership: Store<Option<Membership>>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Arc<Self>, ClientError> {
        let session_id = conn
            .session_id()
            .ok_or_else(|| ClientError::InvalidInput("presence needs a session scope".into()))?;
        conn.send(ClientRequest::GetSessionData { session_id })?;

        let session: Store<Option<Session>> = Store::default();
        let online: Store<Vec<Collaborator>> = Store::default();
        let elapsed_ms: Store<u64> = Store::default();
        let timer: Arc<Mutex<Option<JoinHandle<()>>>> = Arc::new(Mutex::new(None));
        let bus = conn.bus();
        let mut subs = Vec::new();

        {
            let session = session.clone();
            let online = online.clone();
            let membership = membership.clone();
            let identity = identity.clone();
            let elapsed_ms = elapsed_ms.clone();
            let timer = timer.clone();
            subs.push(bus.subscribe(EventKind::TotalSessionData, move |event| {
                let ServerEvent::TotalSessionData(data) = event else {
                    return;
                };
                if data.session.id != session_id {
                    return;
                }
                let Some(me) = identity.get() else { return };
                let own = data.session.users.iter().find(|m| m.user.id == me.id);
                let Some(own) = own else {
                    // Not a member: deny the view and send the caller
                    // back to the dashboard.
                    notifier.notify(
                        "You do not have access to this session",
                        Severity::Error,
                    );
                    navigator.navigate(Route::Dashboard);
                    return;
                };
                membership.set(Some(own.clone()));
                session.set(Some(data.session.clone()));
                online.set(data.online_users.clone());
                restart_timer(&timer, &elapsed_ms, data.time_spent);
            }));
        }

        {
            let online = online.clone();
            subs.push(bus.subscribe(EventKind::NewOnlineUser, move |event| {
                if let ServerEvent::NewOnlineUser(collaborator) = event {
                    online.update(|list| upsert(list, collaborator.clone(), InsertAt::Tail));
                }
            }));
        }

        {
            let online = online.clone();
            subs.push(bus.subscribe(EventKind::UserLeft, move |event| {
                if let ServerEvent::UserLeft(left) = event {
                    online.update(|list| {
                        remove(list, left.user_id);
                    });
                }
            }));
        }

        {
            let online = online.clone();
            let membership = membership.clone();
            let session = session.clone();
            let identity = identity.clone();
            subs.push(bus.subscribe(EventKind::PermissionsChanged, move |event| {
                let ServerEvent::PermissionsChanged(change) = event else {
                    return;
                };
                online.update(|list| {
                    if let Some(entry) = list.iter_mut().find(|c| c.id == change.user_id) {
                        entry.permission = change.permission;
                    }
                });
                session.update(|s| {
                    if let Some(s) = s.as_mut() {
                        if let Some(m) =
                            s.users.iter_mut().find(|m| m.user.id == change.user_id)
                        {
                            m.permission = change.permission;
                        }
                    }
                });
                let is_local = identity
                    .get()
                    .map(|me| me.id == change.user_id)
                    .unwrap_or(false);
                if is_local {
                    membership.update(|m| {
                        if let Some(m) = m.as_mut() {
                            m.permission = change.permission;
                        }
                    });
                }
            }));
        }

        Ok(Arc::new(Self {
            session,
            online,
            membership,
            elapsed_ms,
            timer,
            _subs: subs,
        }))
    }

    pub fn session(&self) -> &Store<Option<Session>> {
        &self.session
    }

    /// Collaborators currently online in the session.
    pub fn online(&self) -> &Store<Vec<Collaborator>> {
        &self.online
    }

    /// The local user's membership, once the snapshot has confirmed it.
    pub fn membership(&self) -> &Store<Option<Membership>> {
        &self.membership
    }

    /// Interpolated session elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> &Store<u64> {
        &self.elapsed_ms
    }

    /// Stop the timer. Called on view teardown; also runs on drop.
    pub fn teardown(&self) {
        if let Some(handle) = self.timer.lock().expect("timer lock poisoned").take() {
            handle.abort();
        }
    }
}

impl Drop for PresenceService {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Replace the tick task with one anchored at the new baseline.
fn restart_timer(
    timer: &Arc<Mutex<Option<JoinHandle<()>>>>,
    elapsed_ms: &Store<u64>,
    baseline_secs: u64,
) {
    let baseline_ms = baseline_secs * 1000;
    let anchor = Instant::now();
    elapsed_ms.set(baseline_ms);
    debug!(baseline_ms, "session timer rebased");

    let elapsed_ms = elapsed_ms.clone();
    let task = tokio::spawn(async move {
        let mut ticks = interval(Duration::from_secs(1));
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticks.tick().await; // first tick completes immediately
        loop {
            ticks.tick().await;
            elapsed_ms.set(baseline_ms + anchor.elapsed().as_millis() as u64);
        }
    });

    let previous = timer
        .lock()
        .expect("timer lock poisoned")
        .replace(task);
    if let Some(previous) = previous {
        previous.abort();
    }
}
