//! Document list reconciliation for a session view.
//!
//! Tracks the session's document collection (most-recent-first) and the
//! id of the most recently edited document. Removal side effects for an
//! *open* document live in the document view, not here — a list is just
//! filtered.

use crate::bus::SubscriptionGuard;
use crate::connection::Connection;
use crate::error::ClientError;
use crate::reconcile::{remove, upsert, InsertAt};
use crate::store::Store;
use cowrite_protocol::{ClientRequest, Document, EventKind, ServerEvent};
use std::sync::Arc;

/// Reconciled document collection for one session.
pub struct DocumentListReconciler {
    session_id: i64,
    documents: Store<Vec<Document>>,
    last_edited: Store<Option<i64>>,
    _subs: Vec<SubscriptionGuard>,
}

impl DocumentListReconciler {
    /// Mount on a session-scoped connection: fetch the current list and
    /// start folding document events into it.
    pub fn mount(conn: &Arc<Connection>) -> Result<Arc<Self>, ClientError> {
        let session_id = conn
            .session_id()
            .ok_or_else(|| ClientError::InvalidInput("document list needs a session scope".into()))?;
        conn.send(ClientRequest::GetSessionDocuments { session_id })?;

        let documents: Store<Vec<Document>> = Store::default();
        let last_edited: Store<Option<i64>> = Store::default();
        let bus = conn.bus();
        let mut subs = Vec::new();

        let docs = documents.clone();
        subs.push(bus.subscribe(EventKind::SessionDocuments, move |event| {
            if let ServerEvent::SessionDocuments(list) = event {
                docs.set(
                    list.iter()
                        .filter(|d| d.session_id == session_id)
                        .cloned()
                        .collect(),
                );
            }
        }));

        for kind in [
            EventKind::DocumentCreated,
            EventKind::DocumentUpdated,
            EventKind::DocumentDuplicated,
        ] {
            let docs = documents.clone();
            subs.push(bus.subscribe(kind, move |event| {
                let (ServerEvent::DocumentCreated(doc)
                | ServerEvent::DocumentUpdated(doc)
                | ServerEvent::DocumentDuplicated(doc)) = event
                else {
                    return;
                };
                if doc.session_id != session_id {
                    return;
                }
                docs.update(|items| upsert(items, doc.clone(), InsertAt::Head));
            }));
        }

        let docs = documents.clone();
        let edited = last_edited.clone();
        subs.push(bus.subscribe(EventKind::LastEditedDocument, move |event| {
            if let ServerEvent::LastEditedDocument(doc) = event {
                if doc.session_id != session_id {
                    return;
                }
                edited.set(Some(doc.id));
                docs.update(|items| upsert(items, doc.clone(), InsertAt::Head));
            }
        }));

        let docs = documents.clone();
        subs.push(bus.subscribe(EventKind::DocumentDeleted, move |event| {
            if let ServerEvent::DocumentDeleted(deleted) = event {
                if deleted.session_id != session_id {
                    return;
                }
                docs.update(|items| {
                    remove(items, deleted.document_id);
                });
            }
        }));

        Ok(Arc::new(Self {
            session_id,
            documents,
            last_edited,
            _subs: subs,
        }))
    }

    pub fn session_id(&self) -> i64 {
        self.session_id
    }

    /// The reconciled collection, most-recent-first.
    pub fn documents(&self) -> &Store<Vec<Document>> {
        &self.documents
    }

    /// Id of the most recently edited document, if the authority has
    /// announced one.
    pub fn last_edited(&self) -> &Store<Option<i64>> {
        &self.last_edited
    }
}
