//! Typed synchronous pub/sub used for change notifications.
//!
//! `emit` calls a snapshot of the listeners taken under the lock, then
//! releases the lock before any callback runs. A listener removed during an
//! emission is still called in that round; one added during an emission
//! first hears the next event. Listener panics propagate to the caller.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Handle returned by [`EventEmitter::on`].
pub type ListenerId = u64;

pub type ListenerFn<T> = dyn Fn(&T) + Send + Sync;

/// Listeners are keyed by a monotonically increasing id, so iteration order
/// is registration order.
pub struct EventEmitter<T> {
    listeners: Mutex<BTreeMap<ListenerId, Arc<ListenerFn<T>>>>,
    next_id: AtomicU64,
}

impl<T> EventEmitter<T> {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn on(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().insert(id, Arc::new(callback));
        id
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn off(&self, id: ListenerId) -> bool {
        self.listeners.lock().remove(&id).is_some()
    }

    pub fn emit(&self, event: &T) {
        let snapshot: Vec<Arc<ListenerFn<T>>> = self.listeners.lock().values().cloned().collect();
        for listener in snapshot {
            listener(event);
        }
    }

    pub fn size(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }
}

impl<T> Default for EventEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}
