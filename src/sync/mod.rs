//! Replays the offline queue against the remote API.
//!
//! A drain is one full pass over the actions that were pending when the
//! pass started. Processing is strictly sequential in enqueue order since
//! later actions may depend on earlier ones having reached the server (a
//! wallet top-up before the parking extension that spends it). Failures
//! count against a per-action retry ceiling; an action that exhausts its
//! retries is dropped rather than retried forever.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::connectivity::ConnectivityMonitor;
use crate::queue::{ActionQueue, QueuedAction};
use crate::transport::{RemoteApi, RemoteRequest};

/// Counts for one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainOutcome {
    /// Actions removed after a successful remote call
    pub synced: usize,
    /// Actions whose attempt failed, terminal drops included
    pub failed: usize,
}

/// Drives pending actions to the remote API.
pub struct SyncEngine {
    queue: Arc<ActionQueue>,
    api: Arc<dyn RemoteApi>,
    connectivity: Arc<dyn ConnectivityMonitor>,
    max_retries: u32,
    draining: AtomicBool,
}

impl SyncEngine {
    /// Create an engine over the given queue and API client.
    pub fn new(
        queue: Arc<ActionQueue>,
        api: Arc<dyn RemoteApi>,
        connectivity: Arc<dyn ConnectivityMonitor>,
        max_retries: u32,
    ) -> Self {
        Self {
            queue,
            api,
            connectivity,
            max_retries,
            draining: AtomicBool::new(false),
        }
    }

    /// One full pass over the actions pending at the start of the pass.
    ///
    /// Returns an empty outcome immediately when offline, when nothing is
    /// pending, or when another pass is already running. Actions enqueued
    /// while a pass is in flight are picked up by the next pass, not this
    /// one.
    pub async fn drain(&self) -> DrainOutcome {
        if !self.connectivity.is_online() || self.queue.is_empty().await {
            return DrainOutcome::default();
        }

        if self
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Drain already in progress, skipping");
            return DrainOutcome::default();
        }

        let snapshot = self.queue.pending().await;
        tracing::info!(pending = snapshot.len(), "Draining offline queue");

        let mut outcome = DrainOutcome::default();
        for action in &snapshot {
            match self.replay(action).await {
                Ok(()) => {
                    self.queue.complete(&action.id).await;
                    outcome.synced += 1;
                }
                Err(reason) => {
                    self.queue
                        .record_failure(&action.id, self.max_retries, &reason)
                        .await;
                    outcome.failed += 1;
                }
            }
        }

        // One durable write per pass, not per entry
        self.queue.flush().await;
        self.draining.store(false, Ordering::Release);

        tracing::info!(
            synced = outcome.synced,
            failed = outcome.failed,
            "Drain pass finished"
        );
        outcome
    }

    /// Manual sync trigger for the UI's "Sync Now".
    ///
    /// Returns an empty outcome while offline, otherwise behaves exactly
    /// like an automatic drain.
    pub async fn force_sync(&self) -> DrainOutcome {
        if !self.connectivity.is_online() {
            tracing::debug!("Sync requested while offline, ignoring");
            return DrainOutcome::default();
        }

        self.drain().await
    }

    async fn replay(&self, action: &QueuedAction) -> Result<(), String> {
        let request = RemoteRequest::for_action(action).map_err(|e| e.to_string())?;

        self.api
            .execute(request)
            .await
            .map_err(|e| e.to_string())
    }
}
