//! Composition point for the offline queue.
//!
//! [`OfflineQueue`] is constructed once at application startup with the
//! host's injected store, connectivity monitor, and API client. It owns a
//! background worker that turns enqueue hints and offline-to-online
//! transitions into drain passes, so callers never block on network
//! completion.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::QueueConfig;
use crate::connectivity::ConnectivityMonitor;
use crate::notify::{QueueListener, Subscription};
use crate::queue::{ActionDomain, ActionQueue, QueuedAction};
use crate::storage::PersistedStore;
use crate::sync::{DrainOutcome, SyncEngine};
use crate::transport::RemoteApi;

/// Why the worker was asked to attempt a drain.
#[derive(Debug, Clone, Copy)]
enum DrainReason {
    Startup,
    Enqueued,
}

/// Offline action queue service.
///
/// Mutations recorded through [`enqueue`](Self::enqueue) survive restarts
/// and are replayed in order once the device is online. Dropping the
/// service stops the background worker; [`shutdown`](Self::shutdown) does
/// the same but waits for it to finish.
pub struct OfflineQueue {
    queue: Arc<ActionQueue>,
    engine: Arc<SyncEngine>,
    connectivity: Arc<dyn ConnectivityMonitor>,
    hints: mpsc::UnboundedSender<DrainReason>,
    worker: JoinHandle<()>,
}

impl OfflineQueue {
    /// Load persisted state and start the background sync worker.
    ///
    /// Actions restored from a previous run are replayed right away when
    /// the device is already online.
    pub async fn start(
        config: &QueueConfig,
        store: Arc<dyn PersistedStore>,
        connectivity: Arc<dyn ConnectivityMonitor>,
        api: Arc<dyn RemoteApi>,
    ) -> Self {
        let queue = ActionQueue::load(store, config.storage_key.clone()).await;
        let engine = Arc::new(SyncEngine::new(
            queue.clone(),
            api,
            connectivity.clone(),
            config.max_retries,
        ));

        let (hints, hint_rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(engine.clone(), connectivity.watch(), hint_rx));

        let service = Self {
            queue,
            engine,
            connectivity,
            hints,
            worker,
        };

        if service.connectivity.is_online() && !service.queue.is_empty().await {
            let _ = service.hints.send(DrainReason::Startup);
        }

        service
    }

    /// Record a mutation for eventual replay. Returns the queued action's id.
    ///
    /// When the device is online a drain attempt is scheduled in the
    /// background; the caller does not wait for it.
    pub async fn enqueue(
        &self,
        domain: ActionDomain,
        action: impl Into<String>,
        payload: serde_json::Value,
    ) -> String {
        let id = self.queue.enqueue(domain, action, payload).await;

        if self.connectivity.is_online() {
            let _ = self.hints.send(DrainReason::Enqueued);
        }

        id
    }

    /// Remove a pending action by id. Removing an unknown id is a no-op.
    pub async fn dequeue(&self, id: &str) {
        self.queue.dequeue(id).await;
    }

    /// Snapshot of the pending actions in replay order.
    pub async fn pending(&self) -> Vec<QueuedAction> {
        self.queue.pending().await
    }

    /// Number of pending actions.
    pub async fn len(&self) -> usize {
        self.queue.len().await
    }

    /// Whether nothing is pending.
    pub async fn is_empty(&self) -> bool {
        self.queue.is_empty().await
    }

    /// Drop every pending action (account sign-out path).
    pub async fn clear(&self) {
        self.queue.clear().await;
    }

    /// Register a queue observer. See [`ActionQueue::subscribe`].
    pub async fn subscribe(&self, listener: QueueListener) -> Subscription {
        self.queue.subscribe(listener).await
    }

    /// Run a drain pass inline and return its counts.
    ///
    /// Returns an empty outcome while offline or while an automatic pass is
    /// already running.
    pub async fn force_sync(&self) -> DrainOutcome {
        self.engine.force_sync().await
    }

    /// Current connectivity as reported by the monitor.
    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// The underlying queue, for hosts that need direct access.
    pub fn queue(&self) -> Arc<ActionQueue> {
        self.queue.clone()
    }

    /// Stop the background worker and wait for it to finish.
    pub async fn shutdown(self) {
        let Self { hints, worker, .. } = self;
        drop(hints);

        if let Err(e) = worker.await {
            tracing::warn!(error = %e, "Sync worker did not shut down cleanly");
        }
    }
}

/// Background loop turning drain hints and connectivity transitions into
/// drain passes.
async fn run_worker(
    engine: Arc<SyncEngine>,
    mut connectivity: watch::Receiver<bool>,
    mut hints: mpsc::UnboundedReceiver<DrainReason>,
) {
    let mut was_online = *connectivity.borrow();
    tracing::info!(online = was_online, "Sync worker started");

    loop {
        tokio::select! {
            hint = hints.recv() => {
                match hint {
                    Some(reason) => {
                        tracing::debug!(?reason, "Drain requested");
                        engine.drain().await;
                    }
                    None => break,
                }
            }
            changed = connectivity.changed() => {
                if changed.is_err() {
                    tracing::debug!("Connectivity watch closed, stopping sync worker");
                    break;
                }

                let online = *connectivity.borrow_and_update();
                if online && !was_online {
                    tracing::info!("Connectivity restored, draining offline queue");
                    engine.drain().await;
                }
                was_online = online;
            }
        }
    }

    tracing::info!("Sync worker stopped");
}
