//! Narrowly-scoped reactive values.
//!
//! Each concern (identity, membership, a reconciled collection, the
//! elapsed-time counter) gets its own [`Store`]; components read and
//! subscribe instead of reaching into a shared singleton, and no store
//! knows about any other.

use std::sync::Arc;
use tokio::sync::watch;

/// A single reactive value with change notification.
///
/// Cloning a `Store` clones the handle, not the value; all clones see
/// the same state. Writes are last-wins, which matches the
/// server-authoritative model: a store only ever holds the latest
/// projection.
pub struct Store<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Clone> Store<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Current value, cloned out.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Replace the value and notify subscribers.
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Patch the value in place and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }

    /// Subscribe to changes. The receiver observes the value at
    /// subscription time and every replacement after it.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone + Default> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
