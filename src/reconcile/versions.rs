//! Version history reconciliation for one document.
//!
//! Versions are immutable and newest-first; the authority creates one
//! on every committed content change, so `versionCreated` deltas arrive
//! steadily while a document is being edited anywhere.

use crate::bus::SubscriptionGuard;
use crate::connection::Connection;
use crate::error::ClientError;
use crate::reconcile::{upsert, InsertAt};
use crate::store::Store;
use cowrite_protocol::{ClientRequest, EventKind, ServerEvent, Version};
use std::sync::Arc;

/// Reconciled version history for one document.
pub struct VersionReconciler {
    document_id: i64,
    versions: Store<Vec<Version>>,
    _subs: Vec<SubscriptionGuard>,
}

impl VersionReconciler {
    pub fn mount(conn: &Arc<Connection>, document_id: i64) -> Result<Arc<Self>, ClientError> {
        conn.send(ClientRequest::GetVersions { document_id })?;

        let versions: Store<Vec<Version>> = Store::default();
        let bus = conn.bus();
        let mut subs = Vec::new();

        let store = versions.clone();
        subs.push(bus.subscribe(EventKind::VersionsData, move |event| {
            if let ServerEvent::VersionsData(list) = event {
                store.set(
                    list.iter()
                        .filter(|v| v.document_id == document_id)
                        .cloned()
                        .collect(),
                );
            }
        }));

        let store = versions.clone();
        subs.push(bus.subscribe(EventKind::VersionCreated, move |event| {
            if let ServerEvent::VersionCreated(version) = event {
                if version.document_id != document_id {
                    return;
                }
                store.update(|items| upsert(items, version.clone(), InsertAt::Head));
            }
        }));

        Ok(Arc::new(Self {
            document_id,
            versions,
            _subs: subs,
        }))
    }

    pub fn document_id(&self) -> i64 {
        self.document_id
    }

    /// The reconciled history, newest-first.
    pub fn versions(&self) -> &Store<Vec<Version>> {
        &self.versions
    }
}
