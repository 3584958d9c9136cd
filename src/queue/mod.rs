//! Durable FIFO queue of offline actions.
//!
//! The queue keeps pending actions in memory in enqueue order and mirrors
//! the whole sequence into a [`PersistedStore`] blob after every completed
//! mutation, so a process restart resumes exactly where the previous run
//! stopped. Subscribers are pushed a fresh snapshot after each mutation.

mod models;

pub use models::{ActionDomain, QueuedAction};

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::notify::{QueueListener, QueueNotifier, Subscription};
use crate::storage::PersistedStore;

/// What happened to an entry after a failed replay attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailureDisposition {
    /// Entry stays queued for a future drain
    Retained { retry_count: u32 },
    /// Entry hit the retry ceiling and was dropped
    Dropped,
    /// Entry was no longer present
    Missing,
}

/// Ordered collection of pending actions, mirrored to durable storage.
pub struct ActionQueue {
    entries: RwLock<Vec<QueuedAction>>,
    store: Arc<dyn PersistedStore>,
    storage_key: String,
    notifier: QueueNotifier,
}

impl ActionQueue {
    /// Load the persisted queue.
    ///
    /// A missing blob starts an empty queue; an unreadable blob is logged
    /// and discarded, so a corrupt entry can never wedge the mechanism.
    pub async fn load(store: Arc<dyn PersistedStore>, storage_key: impl Into<String>) -> Arc<Self> {
        let storage_key = storage_key.into();

        let entries = match store.get(&storage_key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<QueuedAction>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(error = %e, "Persisted queue is unreadable, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load persisted queue, starting empty");
                Vec::new()
            }
        };

        if !entries.is_empty() {
            tracing::info!(pending = entries.len(), "Restored offline queue");
        }

        Arc::new(Self {
            entries: RwLock::new(entries),
            store,
            storage_key,
            notifier: QueueNotifier::new(),
        })
    }

    /// Append a new action and durably record it. Returns the assigned id.
    ///
    /// Never fails from the caller's point of view: a persistence write
    /// error is logged and the in-memory queue runs ahead of the store
    /// until the next successful flush.
    pub async fn enqueue(
        &self,
        domain: ActionDomain,
        action: impl Into<String>,
        payload: serde_json::Value,
    ) -> String {
        let entry = QueuedAction::new(domain, action, payload);
        let id = entry.id.clone();

        self.entries.write().await.push(entry);
        tracing::debug!(action_id = %id, domain = %domain, "Action enqueued");

        self.flush().await;
        id
    }

    /// Remove the entry with `id` if it is still present.
    ///
    /// Removing an id that is already gone is a no-op, so completed actions
    /// can be cleaned up idempotently.
    pub async fn dequeue(&self, id: &str) {
        let removed = {
            let mut entries = self.entries.write().await;
            let before = entries.len();
            entries.retain(|entry| entry.id != id);
            before != entries.len()
        };

        if removed {
            tracing::debug!(action_id = %id, "Action dequeued");
        }

        self.flush().await;
    }

    /// Snapshot of the pending actions in replay order.
    pub async fn pending(&self) -> Vec<QueuedAction> {
        self.entries.read().await.clone()
    }

    /// Number of pending actions.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the queue has no pending actions.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop every pending action.
    pub async fn clear(&self) {
        let dropped = {
            let mut entries = self.entries.write().await;
            let count = entries.len();
            entries.clear();
            count
        };

        if dropped > 0 {
            tracing::info!(dropped, "Offline queue cleared");
        }

        self.flush().await;
    }

    /// Register an observer.
    ///
    /// The listener is invoked synchronously with the current snapshot
    /// before this returns, then with a fresh snapshot after every
    /// mutation until the subscription is dropped.
    pub async fn subscribe(&self, listener: QueueListener) -> Subscription {
        let snapshot = self.pending().await;
        listener(&snapshot);
        self.notifier.subscribe(listener)
    }

    /// Remove a successfully replayed entry without persisting.
    ///
    /// The sync engine persists once per pass via [`flush`](Self::flush).
    pub(crate) async fn complete(&self, id: &str) {
        self.entries.write().await.retain(|entry| entry.id != id);
    }

    /// Record a failed attempt against an entry.
    ///
    /// The retry count only ever increases. Once it reaches `ceiling` the
    /// entry is dropped for good and the terminal failure is logged.
    pub(crate) async fn record_failure(
        &self,
        id: &str,
        ceiling: u32,
        reason: &str,
    ) -> FailureDisposition {
        let mut entries = self.entries.write().await;

        let Some(index) = entries.iter().position(|entry| entry.id == id) else {
            return FailureDisposition::Missing;
        };

        entries[index].retry_count += 1;
        let retry_count = entries[index].retry_count;

        if retry_count >= ceiling {
            let entry = entries.remove(index);
            tracing::error!(
                action_id = %entry.id,
                domain = %entry.domain,
                action = %entry.action,
                attempts = retry_count,
                reason = %reason,
                "Action dropped after exhausting retries"
            );
            FailureDisposition::Dropped
        } else {
            tracing::debug!(
                action_id = %id,
                retry_count,
                reason = %reason,
                "Replay attempt failed, action kept for retry"
            );
            FailureDisposition::Retained { retry_count }
        }
    }

    /// Persist the current sequence, then notify subscribers.
    ///
    /// Subscribers are skipped when the write fails, so they never observe
    /// a mutation that is not durable yet.
    pub(crate) async fn flush(&self) {
        let snapshot = self.pending().await;

        let raw = match serde_json::to_string(&snapshot) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize offline queue");
                return;
            }
        };

        if let Err(e) = self.store.set(&self.storage_key, &raw).await {
            tracing::warn!(error = %e, "Failed to persist offline queue");
            return;
        }

        self.notifier.notify(&snapshot);
    }
}
