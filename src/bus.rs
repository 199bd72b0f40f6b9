//! Typed event bus over the connection's inbound stream.
//!
//! One connection carries every event family, so components register
//! handlers in a dispatch table keyed by [`EventKind`]. Subscriptions
//! are scoped resources: dropping the returned [`SubscriptionGuard`]
//! unregisters the handler, so every subscribe has a matching
//! unsubscribe on the same code path, including early returns.
//!
//! `dispatch` clones the handler list out of the lock before invoking,
//! so a handler may subscribe, unsubscribe, or tear down its whole view
//! reentrantly without deadlocking the bus.

use cowrite_protocol::{EventKind, ServerEvent};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use tracing::trace;
use uuid::Uuid;

type Handler = Arc<dyn Fn(&ServerEvent) + Send + Sync>;

struct Entry {
    id: Uuid,
    handler: Handler,
}

#[derive(Default)]
struct BusInner {
    handlers: Mutex<HashMap<EventKind, Vec<Entry>>>,
}

impl BusInner {
    fn unsubscribe(&self, kind: EventKind, id: Uuid) {
        let mut handlers = self.handlers.lock().expect("bus lock poisoned");
        if let Some(entries) = handlers.get_mut(&kind) {
            entries.retain(|e| e.id != id);
            if entries.is_empty() {
                handlers.remove(&kind);
            }
        }
    }
}

/// Dispatch table from event kind to registered handlers.
///
/// Cloning clones the handle, not the table; all clones dispatch into
/// the same set of handlers.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind. The handler runs on the
    /// dispatching task until the guard is dropped.
    pub fn subscribe(
        &self,
        kind: EventKind,
        handler: impl Fn(&ServerEvent) + Send + Sync + 'static,
    ) -> SubscriptionGuard {
        let id = Uuid::new_v4();
        let mut handlers = self.inner.handlers.lock().expect("bus lock poisoned");
        handlers.entry(kind).or_default().push(Entry {
            id,
            handler: Arc::new(handler),
        });
        SubscriptionGuard {
            bus: Arc::downgrade(&self.inner),
            kind,
            id,
        }
    }

    /// Deliver one inbound event to every handler registered for its
    /// kind. Handlers registered mid-dispatch see the next event.
    pub fn dispatch(&self, event: &ServerEvent) {
        let handlers: Vec<Handler> = {
            let table = self.inner.handlers.lock().expect("bus lock poisoned");
            match table.get(&event.kind()) {
                Some(entries) => entries.iter().map(|e| e.handler.clone()).collect(),
                None => Vec::new(),
            }
        };
        if handlers.is_empty() {
            trace!(kind = ?event.kind(), "no handlers for event");
        }
        for handler in handlers {
            handler(event);
        }
    }

    /// Number of handlers registered for a kind (test observability).
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.inner
            .handlers
            .lock()
            .expect("bus lock poisoned")
            .get(&kind)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }
}

/// RAII handle for a registered handler; unsubscribes on drop.
pub struct SubscriptionGuard {
    bus: Weak<BusInner>,
    kind: EventKind,
    id: Uuid,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(self.kind, self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cowrite_protocol::events::UserLeft;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn user_left(user_id: i64) -> ServerEvent {
        ServerEvent::UserLeft(UserLeft { user_id })
    }

    #[test]
    fn dispatch_reaches_matching_handlers_only() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits2 = hits.clone();
        let _guard = bus.subscribe(EventKind::UserLeft, move |_| {
            hits2.fetch_add(1, Ordering::SeqCst);
        });

        bus.dispatch(&user_left(1));
        bus.dispatch(&ServerEvent::Messages(vec![]));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_guard_unsubscribes() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits2 = hits.clone();
        let guard = bus.subscribe(EventKind::UserLeft, move |_| {
            hits2.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(bus.handler_count(EventKind::UserLeft), 1);

        drop(guard);
        assert_eq!(bus.handler_count(EventKind::UserLeft), 0);

        bus.dispatch(&user_left(1));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn handler_may_unsubscribe_itself_during_dispatch() {
        let bus = EventBus::new();
        let slot: Arc<Mutex<Option<SubscriptionGuard>>> = Arc::new(Mutex::new(None));
        let slot2 = slot.clone();
        let guard = bus.subscribe(EventKind::UserLeft, move |_| {
            // Simulates a teardown triggered from inside a handler.
            slot2.lock().unwrap().take();
        });
        *slot.lock().unwrap() = Some(guard);

        bus.dispatch(&user_left(1));
        assert_eq!(bus.handler_count(EventKind::UserLeft), 0);
    }

    #[test]
    fn multiple_handlers_all_run() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h1 = hits.clone();
        let h2 = hits.clone();
        let _g1 = bus.subscribe(EventKind::UserLeft, move |_| {
            h1.fetch_add(1, Ordering::SeqCst);
        });
        let _g2 = bus.subscribe(EventKind::UserLeft, move |_| {
            h2.fetch_add(1, Ordering::SeqCst);
        });

        bus.dispatch(&user_left(1));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn clones_share_the_table() {
        let bus = EventBus::new();
        let other = bus.clone();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits2 = hits.clone();
        let _guard = other.subscribe(EventKind::UserLeft, move |_| {
            hits2.fetch_add(1, Ordering::SeqCst);
        });

        bus.dispatch(&user_left(1));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
