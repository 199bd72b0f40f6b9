//! AI tool correlator tests: client-side validation, in-flight
//! tracking, and completion correlation by requesting user.

use cowrite_client::bus::EventBus;
use cowrite_client::client::{ClientConfig, SessionClient};
use cowrite_client::store::Store;
use cowrite_client::surface::Severity;
use cowrite_client::testing::{
    document, membership, total_session_data, usage, user, RecordingNavigator, RecordingNotifier,
    RecordingTransport,
};
use cowrite_protocol::events::ErrorEvent;
use cowrite_protocol::{AiTool, ClientRequest, Permission, ServerEvent};
use std::sync::Arc;

const SESSION: i64 = 7;
const DOC: i64 = 3;
const LOCAL_USER: i64 = 1;

struct Harness {
    client: SessionClient,
    transport: Arc<RecordingTransport>,
    bus: EventBus,
    notifier: Arc<RecordingNotifier>,
}

fn harness(permission: Permission) -> Harness {
    let transport = Arc::new(RecordingTransport::new());
    let bus = EventBus::new();
    let notifier = Arc::new(RecordingNotifier::new());
    let navigator = Arc::new(RecordingNavigator::new());
    let client = SessionClient::open(
        "7",
        transport.clone(),
        bus.clone(),
        Store::new(Some(user(LOCAL_USER))),
        notifier.clone(),
        navigator,
        ClientConfig::default(),
    )
    .unwrap();
    bus.dispatch(&ServerEvent::TotalSessionData(total_session_data(
        SESSION,
        vec![
            membership(LOCAL_USER, permission),
            membership(2, Permission::Edit),
        ],
        0,
    )));
    Harness {
        client,
        transport,
        bus,
        notifier,
    }
}

fn open_doc(h: &Harness) -> cowrite_client::DocumentView {
    let view = h.client.open_document(DOC).unwrap();
    h.bus
        .dispatch(&ServerEvent::DocumentUpdated(document(DOC, SESSION, "text")));
    view
}

#[tokio::test]
async fn empty_text_is_rejected_with_one_notice() {
    let h = harness(Permission::Edit);
    let view = open_doc(&h);

    view.invoke_tool(AiTool::Summarize, "   ", None).unwrap();

    assert!(h.transport.sent_named("createDocumentAiUsage").is_empty());
    assert_eq!(h.notifier.with_severity(Severity::Warning).len(), 1);
    assert!(!view.ai().in_flight());
}

#[tokio::test]
async fn translate_requires_a_target_language() {
    let h = harness(Permission::Edit);
    let view = open_doc(&h);

    view.invoke_tool(AiTool::Translate, "bonjour", None).unwrap();
    view.invoke_tool(AiTool::Translate, "bonjour", Some("  "))
        .unwrap();

    assert!(h.transport.sent_named("createDocumentAiUsage").is_empty());
    assert_eq!(h.notifier.with_severity(Severity::Warning).len(), 2);
    assert!(!view.ai().in_flight());
}

#[tokio::test]
async fn invoke_emits_one_request_and_raises_the_flag() {
    let h = harness(Permission::Edit);
    let view = open_doc(&h);

    view.invoke_tool(AiTool::Translate, "  bonjour  ", Some("en"))
        .unwrap();

    assert!(view.ai().in_flight());
    assert_eq!(
        h.transport.sent_named("createDocumentAiUsage"),
        vec![ClientRequest::CreateDocumentAiUsage {
            tool: "translate".into(),
            text: "bonjour".into(),
            document_id: DOC,
            target_language: Some("en".into()),
        }]
    );
}

#[tokio::test]
async fn read_only_member_cannot_invoke() {
    let h = harness(Permission::Read);
    let view = open_doc(&h);

    view.invoke_tool(AiTool::Summarize, "some text", None).unwrap();

    assert!(h.transport.sent_named("createDocumentAiUsage").is_empty());
    assert!(!view.ai().in_flight());
}

#[tokio::test]
async fn own_completion_clears_flag_and_opens_result() {
    let h = harness(Permission::Edit);
    let view = open_doc(&h);
    view.invoke_tool(AiTool::Summarize, "some text", None).unwrap();
    assert!(view.ai().in_flight());

    h.bus.dispatch(&ServerEvent::DocumentAiUsageCreated(usage(
        50, DOC, SESSION, LOCAL_USER,
    )));

    assert!(!view.ai().in_flight());
    let result = view.ai().result().get().expect("result view should open");
    assert_eq!(result.id, 50);

    // The shared history picked it up as well.
    assert_eq!(view.usages().usages().get().len(), 1);

    view.ai().clear_result();
    assert!(view.ai().result().get().is_none());
}

#[tokio::test]
async fn bystander_completion_stays_silent() {
    let h = harness(Permission::Edit);
    let view = open_doc(&h);
    view.invoke_tool(AiTool::Summarize, "some text", None).unwrap();

    // Another collaborator's run on the same document completes first.
    h.bus
        .dispatch(&ServerEvent::DocumentAiUsageCreated(usage(51, DOC, SESSION, 2)));

    // No result view for bystanders, and our own request is still
    // pending; the record still enters the shared history.
    assert!(view.ai().result().get().is_none());
    assert!(view.ai().in_flight());
    assert_eq!(view.usages().usages().get().len(), 1);
}

#[tokio::test]
async fn completion_for_another_document_is_ignored() {
    let h = harness(Permission::Edit);
    let view = open_doc(&h);
    view.invoke_tool(AiTool::Summarize, "some text", None).unwrap();

    let mut other = usage(52, DOC, SESSION, LOCAL_USER);
    other.document_id = Some(99);
    h.bus.dispatch(&ServerEvent::DocumentAiUsageCreated(other));

    assert!(view.ai().result().get().is_none());
    assert!(view.ai().in_flight());
    assert!(view.usages().usages().get().is_empty());
}

#[tokio::test]
async fn error_while_in_flight_clears_the_flag() {
    let h = harness(Permission::Edit);
    let view = open_doc(&h);
    view.invoke_tool(AiTool::Summarize, "some text", None).unwrap();
    assert!(view.ai().in_flight());

    h.bus.dispatch(&ServerEvent::Error(ErrorEvent {
        message: "tool backend unavailable".into(),
    }));

    assert!(!view.ai().in_flight());
    assert!(view.ai().result().get().is_none());
}
