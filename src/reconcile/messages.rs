//! Chat reconciliation for a session view.
//!
//! Messages are append-only and chronological; `newMessage` deltas go
//! to the tail, and duplicate deliveries of the same message id are
//! folded in place.

use crate::bus::SubscriptionGuard;
use crate::connection::Connection;
use crate::error::ClientError;
use crate::reconcile::{upsert, InsertAt};
use crate::store::Store;
use cowrite_protocol::{ClientRequest, EventKind, Message, ServerEvent};
use std::sync::Arc;

/// Reconciled chat history for one session.
pub struct MessageReconciler {
    session_id: i64,
    messages: Store<Vec<Message>>,
    _subs: Vec<SubscriptionGuard>,
}

impl MessageReconciler {
    pub fn mount(conn: &Arc<Connection>) -> Result<Arc<Self>, ClientError> {
        let session_id = conn
            .session_id()
            .ok_or_else(|| ClientError::InvalidInput("chat needs a session scope".into()))?;
        conn.send(ClientRequest::GetMessages)?;

        let messages: Store<Vec<Message>> = Store::default();
        let bus = conn.bus();
        let mut subs = Vec::new();

        let store = messages.clone();
        subs.push(bus.subscribe(EventKind::Messages, move |event| {
            if let ServerEvent::Messages(list) = event {
                store.set(
                    list.iter()
                        .filter(|m| m.session_id == session_id)
                        .cloned()
                        .collect(),
                );
            }
        }));

        let store = messages.clone();
        subs.push(bus.subscribe(EventKind::NewMessage, move |event| {
            if let ServerEvent::NewMessage(message) = event {
                if message.session_id != session_id {
                    return;
                }
                store.update(|items| upsert(items, message.clone(), InsertAt::Tail));
            }
        }));

        Ok(Arc::new(Self {
            session_id,
            messages,
            _subs: subs,
        }))
    }

    pub fn session_id(&self) -> i64 {
        self.session_id
    }

    /// The reconciled chat history, oldest-first.
    pub fn messages(&self) -> &Store<Vec<Message>> {
        &self.messages
    }
}
