//! AI tool usage history reconciliation for one document.
//!
//! The shared history includes completions triggered by every
//! collaborator on the document; whether a completion also opens a
//! result view is the correlator's concern, not this list's.

use crate::bus::SubscriptionGuard;
use crate::connection::Connection;
use crate::error::ClientError;
use crate::reconcile::{upsert, InsertAt};
use crate::store::Store;
use cowrite_protocol::{AiToolUsage, ClientRequest, EventKind, ServerEvent};
use std::sync::Arc;

/// Reconciled AI usage history for one document.
pub struct AiUsageReconciler {
    document_id: i64,
    usages: Store<Vec<AiToolUsage>>,
    _subs: Vec<SubscriptionGuard>,
}

impl AiUsageReconciler {
    pub fn mount(conn: &Arc<Connection>, document_id: i64) -> Result<Arc<Self>, ClientError> {
        conn.send(ClientRequest::GetDocumentAiUsage { document_id })?;

        let usages: Store<Vec<AiToolUsage>> = Store::default();
        let bus = conn.bus();
        let mut subs = Vec::new();

        let store = usages.clone();
        subs.push(bus.subscribe(EventKind::DocumentAiUsage, move |event| {
            if let ServerEvent::DocumentAiUsage(list) = event {
                store.set(
                    list.iter()
                        .filter(|u| u.document_id == Some(document_id))
                        .cloned()
                        .collect(),
                );
            }
        }));

        let store = usages.clone();
        subs.push(bus.subscribe(EventKind::DocumentAiUsageCreated, move |event| {
            if let ServerEvent::DocumentAiUsageCreated(usage) = event {
                if usage.document_id != Some(document_id) {
                    return;
                }
                store.update(|items| upsert(items, usage.clone(), InsertAt::Head));
            }
        }));

        Ok(Arc::new(Self {
            document_id,
            usages,
            _subs: subs,
        }))
    }

    pub fn document_id(&self) -> i64 {
        self.document_id
    }

    /// The reconciled history, newest-first.
    pub fn usages(&self) -> &Store<Vec<AiToolUsage>> {
        &self.usages
    }
}
