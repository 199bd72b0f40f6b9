//! Presence and session timer tests.

use cowrite_client::bus::EventBus;
use cowrite_client::connection::{Connection, ViewContext, DEFAULT_REQUEST_TIMEOUT};
use cowrite_client::presence::PresenceService;
use cowrite_client::store::Store;
use cowrite_client::surface::{Route, Severity};
use cowrite_client::testing::{
    collaborator, membership, total_session_data, user, RecordingNavigator, RecordingNotifier,
    RecordingTransport,
};
use cowrite_protocol::events::{PermissionsChanged, UserLeft};
use cowrite_protocol::{Membership, Permission, ServerEvent, User};
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    bus: EventBus,
    notifier: Arc<RecordingNotifier>,
    navigator: Arc<RecordingNavigator>,
    membership: Store<Option<Membership>>,
    presence: Arc<PresenceService>,
    _conn: Arc<Connection>,
}

/// Presence service mounted for session 7, local user 1.
fn harness() -> Harness {
    let transport = Arc::new(RecordingTransport::new());
    let bus = EventBus::new();
    let notifier = Arc::new(RecordingNotifier::new());
    let navigator = Arc::new(RecordingNavigator::new());
    let identity: Store<Option<User>> = Store::new(Some(user(1)));
    let conn = Connection::open(
        ViewContext::Session {
            session_id: "7".into(),
        },
        transport,
        bus.clone(),
        identity.clone(),
        notifier.clone(),
        navigator.clone(),
        DEFAULT_REQUEST_TIMEOUT,
    )
    .unwrap();
    let membership: Store<Option<Membership>> = Store::default();
    let presence = PresenceService::mount(
        &conn,
        identity,
        membership.clone(),
        notifier.clone(),
        navigator.clone(),
    )
    .unwrap();
    Harness {
        bus,
        notifier,
        navigator,
        membership,
        presence,
        _conn: conn,
    }
}

fn members() -> Vec<Membership> {
    vec![
        membership(1, Permission::Edit),
        membership(2, Permission::Admin),
    ]
}

#[tokio::test(start_paused = true)]
async fn timer_interpolates_from_baseline() {
    let h = harness();
    h.bus.dispatch(&ServerEvent::TotalSessionData(
        total_session_data(7, members(), 5),
    ));
    assert_eq!(h.presence.elapsed_ms().get(), 5000);

    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert_eq!(h.presence.elapsed_ms().get(), 7000);
}

#[tokio::test(start_paused = true)]
async fn new_baseline_resets_interpolation() {
    let h = harness();
    h.bus.dispatch(&ServerEvent::TotalSessionData(
        total_session_data(7, members(), 5),
    ));
    tokio::time::sleep(Duration::from_millis(2100)).await;

    // A fresh snapshot rebases the timer; ticks no longer accumulate on
    // the old anchor.
    h.bus.dispatch(&ServerEvent::TotalSessionData(
        total_session_data(7, members(), 50),
    ));
    assert_eq!(h.presence.elapsed_ms().get(), 50_000);

    tokio::time::sleep(Duration::from_millis(1050)).await;
    assert_eq!(h.presence.elapsed_ms().get(), 51_000);
}

#[tokio::test(start_paused = true)]
async fn teardown_stops_the_timer() {
    let h = harness();
    h.bus.dispatch(&ServerEvent::TotalSessionData(
        total_session_data(7, members(), 5),
    ));
    h.presence.teardown();

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(h.presence.elapsed_ms().get(), 5000);
}

#[tokio::test]
async fn missing_membership_denies_the_view() {
    let h = harness();
    // Session snapshot without user 1 among the members.
    h.bus.dispatch(&ServerEvent::TotalSessionData(
        total_session_data(7, vec![membership(2, Permission::Admin)], 0),
    ));

    assert!(h.membership.get().is_none());
    assert_eq!(h.notifier.with_severity(Severity::Error).len(), 1);
    assert_eq!(h.navigator.routes(), vec![Route::Dashboard]);
}

#[tokio::test]
async fn accepted_snapshot_populates_stores() {
    let h = harness();
    h.bus.dispatch(&ServerEvent::TotalSessionData(
        total_session_data(7, members(), 12),
    ));

    assert_eq!(
        h.membership.get().map(|m| m.permission),
        Some(Permission::Edit)
    );
    assert_eq!(h.presence.online().get().len(), 2);
    assert!(h.presence.session().get().is_some());
    assert!(h.notifier.notices().is_empty());
    assert!(h.navigator.routes().is_empty());
}

#[tokio::test]
async fn foreign_session_snapshot_is_dropped() {
    let h = harness();
    h.bus.dispatch(&ServerEvent::TotalSessionData(
        total_session_data(99, members(), 12),
    ));
    assert!(h.presence.session().get().is_none());
    assert!(h.membership.get().is_none());
}

#[tokio::test]
async fn presence_deltas_patch_online_list() {
    let h = harness();
    h.bus.dispatch(&ServerEvent::TotalSessionData(
        total_session_data(7, members(), 0),
    ));

    h.bus.dispatch(&ServerEvent::NewOnlineUser(collaborator(
        3,
        Permission::Read,
    )));
    assert_eq!(h.presence.online().get().len(), 3);

    // Duplicate join announcements fold in place.
    h.bus.dispatch(&ServerEvent::NewOnlineUser(collaborator(
        3,
        Permission::Read,
    )));
    assert_eq!(h.presence.online().get().len(), 3);

    h.bus
        .dispatch(&ServerEvent::UserLeft(UserLeft { user_id: 2 }));
    let online = h.presence.online().get();
    assert_eq!(online.len(), 2);
    assert!(online.iter().all(|c| c.id != 2));
}

#[tokio::test]
async fn permission_change_updates_member_and_local_membership() {
    let h = harness();
    h.bus.dispatch(&ServerEvent::TotalSessionData(
        total_session_data(7, members(), 0),
    ));

    h.bus
        .dispatch(&ServerEvent::PermissionsChanged(PermissionsChanged {
            user_id: 1,
            permission: Permission::Read,
        }));

    assert_eq!(
        h.membership.get().map(|m| m.permission),
        Some(Permission::Read)
    );
    let online = h.presence.online().get();
    let me = online.iter().find(|c| c.id == 1).unwrap();
    assert_eq!(me.permission, Permission::Read);

    // A change targeting someone else leaves the local membership
    // untouched.
    h.bus
        .dispatch(&ServerEvent::PermissionsChanged(PermissionsChanged {
            user_id: 2,
            permission: Permission::Read,
        }));
    assert_eq!(
        h.membership.get().map(|m| m.permission),
        Some(Permission::Read)
    );
    let online = h.presence.online().get();
    assert_eq!(
        online.iter().find(|c| c.id == 2).unwrap().permission,
        Permission::Read
    );
}
