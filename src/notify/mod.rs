//! Fan-out of queue snapshots to interested observers.
//!
//! UI layers subscribe once and re-render from the pushed snapshot instead
//! of polling the queue. Every subscriber sees every mutation in the order
//! it happened; delivery order across subscribers is unspecified.

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use uuid::Uuid;

use crate::queue::QueuedAction;

/// Callback invoked with a snapshot of the queue after each mutation.
pub type QueueListener = Box<dyn Fn(&[QueuedAction]) + Send + Sync>;

/// Registry of queue observers.
#[derive(Default)]
pub struct QueueNotifier {
    listeners: Arc<DashMap<Uuid, QueueListener>>,
}

impl QueueNotifier {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    ///
    /// The returned subscription unregisters it when dropped or when
    /// [`Subscription::unsubscribe`] is called.
    pub fn subscribe(&self, listener: QueueListener) -> Subscription {
        let id = Uuid::new_v4();
        self.listeners.insert(id, listener);
        tracing::debug!(subscription_id = %id, "Queue listener registered");

        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Push a snapshot to every registered listener.
    pub fn notify(&self, snapshot: &[QueuedAction]) {
        // Collect ids first to avoid holding shard locks across callbacks
        let ids: Vec<Uuid> = self.listeners.iter().map(|entry| *entry.key()).collect();

        for id in ids {
            if let Some(listener) = self.listeners.get(&id) {
                (listener.value())(snapshot);
            }
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

/// Handle for a registered queue listener.
pub struct Subscription {
    id: Uuid,
    listeners: Weak<DashMap<Uuid, QueueListener>>,
}

impl Subscription {
    /// Remove the listener. Dropping the handle has the same effect.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.remove(&self.id);
            tracing::debug!(subscription_id = %self.id, "Queue listener removed");
        }
    }
}
