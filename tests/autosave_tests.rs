//! Autosave tests: debounce collapse, gating, echo suppression, and
//! teardown, driven end-to-end through a session client and an open
//! document view.

use cowrite_client::bus::EventBus;
use cowrite_client::client::{ClientConfig, SessionClient};
use cowrite_client::store::Store;
use cowrite_client::surface::{ChangeSource, Route, Severity};
use cowrite_client::testing::{
    document, membership, total_session_data, user, RecordingNavigator, RecordingNotifier,
    RecordingTransport,
};
use cowrite_protocol::events::DocumentDeleted;
use cowrite_protocol::{ClientRequest, Permission, ServerEvent};
use std::sync::Arc;
use std::time::Duration;

const SESSION: i64 = 7;
const DOC: i64 = 3;

struct Harness {
    client: SessionClient,
    transport: Arc<RecordingTransport>,
    bus: EventBus,
    notifier: Arc<RecordingNotifier>,
    navigator: Arc<RecordingNavigator>,
}

/// Session client for session 7 with the local user (id 1) holding the
/// given permission.
fn harness(permission: Permission) -> Harness {
    let transport = Arc::new(RecordingTransport::new());
    let bus = EventBus::new();
    let notifier = Arc::new(RecordingNotifier::new());
    let navigator = Arc::new(RecordingNavigator::new());
    let client = SessionClient::open(
        "7",
        transport.clone(),
        bus.clone(),
        Store::new(Some(user(1))),
        notifier.clone(),
        navigator.clone(),
        ClientConfig::default(),
    )
    .unwrap();
    bus.dispatch(&ServerEvent::TotalSessionData(total_session_data(
        SESSION,
        vec![membership(1, permission), membership(2, Permission::Edit)],
        0,
    )));
    Harness {
        client,
        transport,
        bus,
        notifier,
        navigator,
    }
}

fn saves(transport: &RecordingTransport) -> Vec<String> {
    transport
        .sent_named("changeContentAndSaveDocument")
        .into_iter()
        .map(|r| match r {
            ClientRequest::ChangeContentAndSaveDocument { new_content, .. } => new_content,
            _ => unreachable!(),
        })
        .collect()
}

/// Load the document into the view and absorb the programmatic change
/// callback the editor fires for it.
fn load(h: &Harness, view: &cowrite_client::DocumentView, content: &str) {
    h.bus.dispatch(&ServerEvent::DocumentUpdated(document(
        DOC, SESSION, content,
    )));
    view.on_editor_change(content, ChangeSource::Api);
}

#[tokio::test(start_paused = true)]
async fn rapid_edits_collapse_to_one_persist() {
    let h = harness(Permission::Edit);
    let view = h.client.open_document(DOC).unwrap();
    load(&h, &view, "hello");

    view.on_editor_change("hello w", ChangeSource::User);
    view.on_editor_change("hello wo", ChangeSource::User);
    view.on_editor_change("hello world", ChangeSource::User);

    tokio::time::sleep(Duration::from_millis(800)).await;
    assert_eq!(saves(&h.transport), vec!["hello world".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn initial_load_callback_is_not_an_edit() {
    let h = harness(Permission::Edit);
    let view = h.client.open_document(DOC).unwrap();
    h.bus.dispatch(&ServerEvent::DocumentUpdated(document(
        DOC, SESSION, "hello",
    )));

    // The editor fires one change callback when content is loaded
    // programmatically; even a user-attributed one must not persist.
    view.on_editor_change("hello", ChangeSource::User);
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(saves(&h.transport).is_empty());
}

#[tokio::test(start_paused = true)]
async fn programmatic_changes_are_ignored() {
    let h = harness(Permission::Edit);
    let view = h.client.open_document(DOC).unwrap();
    load(&h, &view, "hello");

    view.on_editor_change("injected", ChangeSource::Api);
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(saves(&h.transport).is_empty());
}

#[tokio::test(start_paused = true)]
async fn read_only_user_never_persists() {
    let h = harness(Permission::Read);
    let view = h.client.open_document(DOC).unwrap();
    load(&h, &view, "hello");
    assert!(view.read_only());

    // However many change callbacks the editor fires, nothing goes out.
    for i in 0..10 {
        view.on_editor_change(&format!("edit {}", i), ChangeSource::User);
    }
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(saves(&h.transport).is_empty());
}

#[tokio::test(start_paused = true)]
async fn preview_forces_read_only_despite_edit_capability() {
    let h = harness(Permission::Edit);
    let view = h.client.open_document(DOC).unwrap();
    load(&h, &view, "hello");

    view.preview_version(cowrite_client::testing::version(10, DOC, "old content"));
    assert!(view.read_only());
    view.on_editor_change("poked while previewing", ChangeSource::User);
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(saves(&h.transport).is_empty());

    // Closing the preview restores editability.
    view.close_preview();
    assert!(!view.read_only());
    view.on_editor_change("edited after preview", ChangeSource::User);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(saves(&h.transport), vec!["edited after preview".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn unchanged_content_is_not_persisted() {
    let h = harness(Permission::Edit);
    let view = h.client.open_document(DOC).unwrap();
    load(&h, &view, "hello");

    // The user types and then reverts within the quiet window.
    view.on_editor_change("hello!", ChangeSource::User);
    view.on_editor_change("hello", ChangeSource::User);
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(saves(&h.transport).is_empty());
}

#[tokio::test(start_paused = true)]
async fn own_persist_echo_does_not_clobber_buffer() {
    let h = harness(Permission::Edit);
    let view = h.client.open_document(DOC).unwrap();
    load(&h, &view, "hello");

    view.on_editor_change("hello world", ChangeSource::User);
    tokio::time::sleep(Duration::from_millis(800)).await;
    assert_eq!(saves(&h.transport), vec!["hello world".to_string()]);

    // The authority broadcasts our own persist back; no reload happens,
    // so the next user edit goes straight through without an
    // initial-load artifact swallowing it.
    h.bus.dispatch(&ServerEvent::DocumentUpdated(document(
        DOC,
        SESSION,
        "hello world",
    )));
    view.on_editor_change("hello world!", ChangeSource::User);
    tokio::time::sleep(Duration::from_millis(800)).await;
    assert_eq!(
        saves(&h.transport),
        vec!["hello world".to_string(), "hello world!".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn external_update_reloads_and_regates() {
    let h = harness(Permission::Edit);
    let view = h.client.open_document(DOC).unwrap();
    load(&h, &view, "hello");

    // Another collaborator's edit arrives: buffer reloads and the next
    // (programmatic) change callback is absorbed.
    h.bus.dispatch(&ServerEvent::DocumentUpdated(document(
        DOC,
        SESSION,
        "their edit",
    )));
    view.on_editor_change("their edit", ChangeSource::Api);

    view.on_editor_change("their edit plus mine", ChangeSource::User);
    tokio::time::sleep(Duration::from_millis(800)).await;
    assert_eq!(
        saves(&h.transport),
        vec!["their edit plus mine".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn teardown_cancels_pending_persist() {
    let h = harness(Permission::Edit);
    let view = h.client.open_document(DOC).unwrap();
    load(&h, &view, "hello");

    view.on_editor_change("about to close", ChangeSource::User);
    view.close();

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(saves(&h.transport).is_empty());
}

#[tokio::test]
async fn deleting_the_open_document_evicts_the_viewer() {
    let h = harness(Permission::Edit);
    let view = h.client.open_document(DOC).unwrap();
    load(&h, &view, "hello");

    h.bus.dispatch(&ServerEvent::DocumentDeleted(DocumentDeleted {
        document_id: DOC,
        session_id: SESSION,
    }));

    // Exactly one warning and one redirect to the parent session.
    assert_eq!(h.notifier.with_severity(Severity::Warning).len(), 1);
    assert_eq!(h.navigator.routes(), vec![Route::Session(SESSION)]);

    // A different document's removal adds nothing.
    h.bus.dispatch(&ServerEvent::DocumentDeleted(DocumentDeleted {
        document_id: 42,
        session_id: SESSION,
    }));
    assert_eq!(h.notifier.with_severity(Severity::Warning).len(), 1);
    assert_eq!(h.navigator.routes().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn revoked_permission_stops_scheduled_persist() {
    let h = harness(Permission::Edit);
    let view = h.client.open_document(DOC).unwrap();
    load(&h, &view, "hello");

    view.on_editor_change("last words", ChangeSource::User);
    // Revocation lands between the keystroke and the debounce firing.
    h.bus.dispatch(&ServerEvent::PermissionsChanged(
        cowrite_protocol::events::PermissionsChanged {
            user_id: 1,
            permission: Permission::Read,
        },
    ));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(saves(&h.transport).is_empty());
}
