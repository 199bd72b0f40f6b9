//! View composition roots.
//!
//! A mounted top-level view owns exactly one connection:
//! [`DashboardClient`] for the dashboard, [`SessionClient`] for a
//! session. Document views within a session share the session's
//! connection; each one filters strictly by its own document id, so
//! concurrently open documents do not interfere.
//!
//! Teardown is the reverse of mount: cancel timers, drop subscriptions,
//! emit the leave request (session scope), terminate the transport.
//! In-flight AI tool requests are not cancelled — their completions
//! become no-ops once the listeners are detached.

use crate::ai_tools::AiToolCorrelator;
use crate::autosave::{AutosaveCoordinator, DEFAULT_QUIET_PERIOD};
use crate::bus::{EventBus, SubscriptionGuard};
use crate::connection::{Connection, ViewContext, DEFAULT_REQUEST_TIMEOUT};
use crate::dispatch::CommandDispatcher;
use crate::error::ClientError;
use crate::presence::PresenceService;
use crate::reconcile::documents::DocumentListReconciler;
use crate::reconcile::invitations::InvitationReconciler;
use crate::reconcile::messages::MessageReconciler;
use crate::reconcile::usages::AiUsageReconciler;
use crate::reconcile::versions::VersionReconciler;
use crate::store::Store;
use crate::surface::{
    ChangeSource, DocumentExporter, Navigator, Notifier, Route, Severity,
};
use crate::transport::Transport;
use cowrite_protocol::{
    AiTool, ClientRequest, Document, EventKind, Membership, ServerEvent, User, Version,
};
use std::sync::Arc;
use std::time::Duration;

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Timeout for callback-style commands.
    pub request_timeout: Duration,
    /// Autosave quiet period.
    pub quiet_period: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            quiet_period: DEFAULT_QUIET_PERIOD,
        }
    }
}

/// Dashboard view: the signed-in user's notifications.
pub struct DashboardClient {
    conn: Arc<Connection>,
    notifications: Arc<InvitationReconciler>,
    dispatcher: Arc<CommandDispatcher>,
}

impl DashboardClient {
    pub fn open(
        transport: Arc<dyn Transport>,
        bus: EventBus,
        identity: Store<Option<User>>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        let conn = Connection::open(
            ViewContext::Dashboard,
            transport,
            bus,
            identity,
            notifier.clone(),
            navigator,
            config.request_timeout,
        )?;
        let notifications = InvitationReconciler::mount_notifications(&conn)?;
        // The dashboard has no session membership; notification
        // commands are not capability-gated.
        let dispatcher = CommandDispatcher::new(conn.clone(), Store::default(), notifier);
        Ok(Self {
            conn,
            notifications,
            dispatcher,
        })
    }

    pub fn notifications(&self) -> &Arc<InvitationReconciler> {
        &self.notifications
    }

    pub fn dispatcher(&self) -> &Arc<CommandDispatcher> {
        &self.dispatcher
    }

    pub fn close(&self) {
        self.conn.shutdown();
    }
}

impl Drop for DashboardClient {
    fn drop(&mut self) {
        self.close();
    }
}

/// Session view: presence, documents, chat, and invitation management
/// over one shared connection.
pub struct SessionClient {
    conn: Arc<Connection>,
    config: ClientConfig,
    identity: Store<Option<User>>,
    membership: Store<Option<Membership>>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    presence: Arc<PresenceService>,
    documents: Arc<DocumentListReconciler>,
    messages: Arc<MessageReconciler>,
    invitations: Arc<InvitationReconciler>,
    dispatcher: Arc<CommandDispatcher>,
}

impl SessionClient {
    /// Open the session view for a raw route parameter. Validation
    /// failures redirect to the dashboard without joining.
    pub fn open(
        session_id: impl Into<String>,
        transport: Arc<dyn Transport>,
        bus: EventBus,
        identity: Store<Option<User>>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        let conn = Connection::open(
            ViewContext::Session {
                session_id: session_id.into(),
            },
            transport,
            bus,
            identity.clone(),
            notifier.clone(),
            navigator.clone(),
            config.request_timeout,
        )?;

        let membership: Store<Option<Membership>> = Store::default();
        let presence = PresenceService::mount(
            &conn,
            identity.clone(),
            membership.clone(),
            notifier.clone(),
            navigator.clone(),
        )?;
        let documents = DocumentListReconciler::mount(&conn)?;
        let messages = MessageReconciler::mount(&conn)?;
        let invitations = InvitationReconciler::mount_session(&conn)?;
        let dispatcher =
            CommandDispatcher::new(conn.clone(), membership.clone(), notifier.clone());

        Ok(Self {
            conn,
            config,
            identity,
            membership,
            notifier,
            navigator,
            presence,
            documents,
            messages,
            invitations,
            dispatcher,
        })
    }

    pub fn session_id(&self) -> i64 {
        self.conn.session_id().expect("session scope")
    }

    pub fn presence(&self) -> &Arc<PresenceService> {
        &self.presence
    }

    pub fn documents(&self) -> &Arc<DocumentListReconciler> {
        &self.documents
    }

    pub fn messages(&self) -> &Arc<MessageReconciler> {
        &self.messages
    }

    pub fn invitations(&self) -> &Arc<InvitationReconciler> {
        &self.invitations
    }

    pub fn dispatcher(&self) -> &Arc<CommandDispatcher> {
        &self.dispatcher
    }

    pub fn membership(&self) -> &Store<Option<Membership>> {
        &self.membership
    }

    /// Open a document view on this session's connection.
    pub fn open_document(&self, document_id: i64) -> Result<DocumentView, ClientError> {
        DocumentView::mount(
            &self.conn,
            self.dispatcher.clone(),
            self.identity.clone(),
            self.membership.clone(),
            self.notifier.clone(),
            self.navigator.clone(),
            document_id,
            self.config.quiet_period,
        )
    }

    /// Tear the view down: timers first, then the connection (leave,
    /// then terminate).
    pub fn close(&self) {
        self.presence.teardown();
        self.conn.shutdown();
    }
}

impl Drop for SessionClient {
    fn drop(&mut self) {
        self.close();
    }
}

/// One open document within a session view.
pub struct DocumentView {
    document_id: i64,
    dispatcher: Arc<CommandDispatcher>,
    document: Store<Option<Document>>,
    preview: Store<Option<Version>>,
    versions: Arc<VersionReconciler>,
    usages: Arc<AiUsageReconciler>,
    autosave: Arc<AutosaveCoordinator>,
    ai: Arc<AiToolCorrelator>,
    _subs: Vec<SubscriptionGuard>,
}

impl DocumentView {
    #[allow(clippy::too_many_arguments)]
    fn mount(
        conn: &Arc<Connection>,
        dispatcher: Arc<CommandDispatcher>,
        identity: Store<Option<User>>,
        membership: Store<Option<Membership>>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        document_id: i64,
        quiet_period: Duration,
    ) -> Result<Self, ClientError> {
        let session_id = conn
            .session_id()
            .ok_or_else(|| ClientError::InvalidInput("document view needs a session scope".into()))?;
        conn.send(ClientRequest::GetDocument { document_id })?;

        let document: Store<Option<Document>> = Store::default();
        let autosave =
            AutosaveCoordinator::new(conn.clone(), membership, document_id, quiet_period);
        let versions = VersionReconciler::mount(conn, document_id)?;
        let usages = AiUsageReconciler::mount(conn, document_id)?;
        let ai = AiToolCorrelator::mount(
            conn,
            dispatcher.clone(),
            identity,
            notifier.clone(),
            document_id,
        );

        let bus = conn.bus();
        let mut subs = Vec::new();

        // The one-document fetch is answered with a documentUpdated
        // delta; the same handler folds in every later external change.
        {
            let document = document.clone();
            let autosave = autosave.clone();
            subs.push(bus.subscribe(EventKind::DocumentUpdated, move |event| {
                if let ServerEvent::DocumentUpdated(doc) = event {
                    if doc.id != document_id {
                        return;
                    }
                    autosave.apply_remote(doc);
                    document.set(Some(doc.clone()));
                }
            }));
        }

        // Removal of the *open* document evicts this viewer back to the
        // session; list reconcilers elsewhere just filter.
        {
            subs.push(bus.subscribe(EventKind::DocumentDeleted, move |event| {
                if let ServerEvent::DocumentDeleted(deleted) = event {
                    if deleted.document_id != document_id {
                        return;
                    }
                    notifier.notify("This document was deleted", Severity::Warning);
                    navigator.navigate(Route::Session(session_id));
                }
            }));
        }

        Ok(Self {
            document_id,
            dispatcher,
            document,
            preview: Store::default(),
            versions,
            usages,
            autosave,
            ai,
            _subs: subs,
        })
    }

    pub fn document_id(&self) -> i64 {
        self.document_id
    }

    pub fn document(&self) -> &Store<Option<Document>> {
        &self.document
    }

    pub fn versions(&self) -> &Arc<VersionReconciler> {
        &self.versions
    }

    pub fn usages(&self) -> &Arc<AiUsageReconciler> {
        &self.usages
    }

    pub fn ai(&self) -> &Arc<AiToolCorrelator> {
        &self.ai
    }

    /// The version currently being previewed, if any.
    pub fn preview(&self) -> &Store<Option<Version>> {
        &self.preview
    }

    /// Whether the editor must render read-only (preview active or no
    /// edit capability).
    pub fn read_only(&self) -> bool {
        self.autosave.read_only()
    }

    /// Editor content-change callback.
    pub fn on_editor_change(&self, content: &str, source: ChangeSource) {
        self.autosave.on_editor_change(content, source);
    }

    /// Show a historical version; the editor becomes read-only until
    /// the preview is closed.
    pub fn preview_version(&self, version: Version) {
        self.autosave.set_previewing(true);
        self.preview.set(Some(version));
    }

    pub fn close_preview(&self) {
        self.preview.set(None);
        self.autosave.set_previewing(false);
    }

    /// Restore the previewed version as the current content. The
    /// restored content arrives back as a documentUpdated delta.
    pub fn apply_version(&self, version_id: i64) -> Result<(), ClientError> {
        self.close_preview();
        self.dispatcher.apply_version(self.document_id, version_id)
    }

    pub fn invoke_tool(
        &self,
        tool: AiTool,
        text: &str,
        target_language: Option<&str>,
    ) -> Result<(), ClientError> {
        self.ai.invoke(tool, text, target_language)
    }

    /// Hand the current document to an export collaborator.
    pub fn export(&self, exporter: &dyn DocumentExporter) -> Result<(), ClientError> {
        let Some(doc) = self.document.get() else {
            return Err(ClientError::InvalidInput("document not loaded yet".into()));
        };
        exporter.export(&doc.title, &doc.content)
    }

    /// Cancel the debounce timer and detach listeners.
    pub fn close(&self) {
        self.autosave.teardown();
    }
}

impl Drop for DocumentView {
    fn drop(&mut self) {
        self.close();
    }
}
