//! AI tool invocation and completion correlation.
//!
//! Tool runs are long-lived and asynchronous: the request is
//! fire-and-forget and the created usage record arrives later as a
//! `documentAiUsageCreated` delta — to every collaborator on the
//! document, not just the requester. The correlator matches completions
//! back to the requesting (document, user) pair: only the requester's
//! own completion clears the in-flight flag and opens a result view;
//! bystanders see the record in the shared history list only.
//!
//! There is no client-visible timeout: the flag persists until a
//! completion or a generic error arrives, or the view is torn down
//! (which detaches the listener; a late completion is then a no-op).

use crate::bus::SubscriptionGuard;
use crate::connection::Connection;
use crate::dispatch::CommandDispatcher;
use crate::error::ClientError;
use crate::store::Store;
use crate::surface::{Notifier, Severity};
use cowrite_protocol::{AiTool, AiToolUsage, EventKind, ServerEvent, User};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Correlates tool invocations with their completion events for one
/// open document.
pub struct AiToolCorrelator {
    document_id: i64,
    dispatcher: Arc<CommandDispatcher>,
    notifier: Arc<dyn Notifier>,
    in_flight: Arc<AtomicBool>,
    result: Store<Option<AiToolUsage>>,
    _subs: Vec<SubscriptionGuard>,
}

impl AiToolCorrelator {
    pub fn mount(
        conn: &Arc<Connection>,
        dispatcher: Arc<CommandDispatcher>,
        identity: Store<Option<User>>,
        notifier: Arc<dyn Notifier>,
        document_id: i64,
    ) -> Arc<Self> {
        let in_flight = Arc::new(AtomicBool::new(false));
        let result: Store<Option<AiToolUsage>> = Store::default();
        let bus = conn.bus();
        let mut subs = Vec::new();

        {
            let in_flight = in_flight.clone();
            let result = result.clone();
            subs.push(bus.subscribe(EventKind::DocumentAiUsageCreated, move |event| {
                let ServerEvent::DocumentAiUsageCreated(usage) = event else {
                    return;
                };
                if usage.document_id != Some(document_id) {
                    return;
                }
                let own = identity
                    .get()
                    .map(|me| me.id == usage.user_id)
                    .unwrap_or(false);
                if !own {
                    // A collaborator's completion on the shared
                    // document; the history reconciler picks it up.
                    return;
                }
                in_flight.store(false, Ordering::SeqCst);
                result.set(Some(usage.clone()));
            }));
        }

        {
            // A domain error while a request is in flight means the
            // invocation failed; clear the flag, produce no result.
            let in_flight = in_flight.clone();
            subs.push(bus.subscribe(EventKind::Error, move |_| {
                if in_flight.swap(false, Ordering::SeqCst) {
                    debug!("tool request failed, in-flight flag cleared");
                }
            }));
        }

        Arc::new(Self {
            document_id,
            dispatcher,
            notifier,
            in_flight,
            result,
            _subs: subs,
        })
    }

    /// Request a tool invocation on the open document.
    ///
    /// Validation failures notify the user and send nothing; the
    /// in-flight flag is only raised once a request actually goes out.
    pub fn invoke(
        &self,
        tool: AiTool,
        text: &str,
        target_language: Option<&str>,
    ) -> Result<(), ClientError> {
        let text = text.trim();
        if text.is_empty() {
            self.notifier
                .notify("Select some text to run this tool on", Severity::Warning);
            return Ok(());
        }
        let target_language = target_language.map(str::trim).filter(|l| !l.is_empty());
        if tool.requires_target_language() && target_language.is_none() {
            self.notifier
                .notify("Select a target language", Severity::Warning);
            return Ok(());
        }
        if !self.dispatcher.capability().edit {
            return Ok(());
        }

        self.in_flight.store(true, Ordering::SeqCst);
        self.dispatcher.create_ai_usage(
            tool,
            text.to_string(),
            self.document_id,
            target_language.map(str::to_string),
        )
    }

    /// Whether a tool request is awaiting its completion.
    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// The result to present, set only for the requester's own
    /// completions.
    pub fn result(&self) -> &Store<Option<AiToolUsage>> {
        &self.result
    }

    /// Dismiss the result view.
    pub fn clear_result(&self) {
        self.result.set(None);
    }
}
