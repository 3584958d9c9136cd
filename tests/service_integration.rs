//! Offline queue service integration tests
//!
//! End-to-end flows through the `OfflineQueue` facade: offline capture,
//! automatic replay on reconnect, persistence across simulated restarts,
//! and subscriber notifications.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use urbo_offline_queue::config::QueueConfig;
use urbo_offline_queue::connectivity::WatchMonitor;
use urbo_offline_queue::queue::ActionDomain;
use urbo_offline_queue::service::OfflineQueue;
use urbo_offline_queue::storage::MemoryStore;
use urbo_offline_queue::sync::DrainOutcome;
use urbo_offline_queue::transport::{HttpMethod, RemoteApi, RemoteRequest, SendError};

/// Remote API fake that records requests and always succeeds.
struct RecordingApi {
    requests: Mutex<Vec<RemoteRequest>>,
}

impl RecordingApi {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<RemoteRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteApi for RecordingApi {
    async fn execute(&self, request: RemoteRequest) -> Result<(), SendError> {
        self.requests.lock().unwrap().push(request);
        Ok(())
    }
}

/// Wait for the background worker to empty the queue.
async fn wait_for_drain(service: &OfflineQueue) {
    let drained = tokio::time::timeout(Duration::from_secs(2), async {
        while !service.is_empty().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    assert!(drained.is_ok(), "queue did not drain in time");
}

#[tokio::test]
async fn test_offline_enqueue_replays_on_reconnect() {
    let api = RecordingApi::new();
    let store = Arc::new(MemoryStore::new());
    let (monitor, handle) = WatchMonitor::new(false);
    let service = OfflineQueue::start(&QueueConfig::default(), store, monitor, api.clone()).await;

    let snapshots = Arc::new(Mutex::new(Vec::new()));
    let sink = snapshots.clone();
    let _subscription = service
        .subscribe(Box::new(move |snapshot| {
            sink.lock().unwrap().push(snapshot.len());
        }))
        .await;

    service
        .enqueue(ActionDomain::Parking, "start", json!({"zone": "A"}))
        .await;

    assert_eq!(service.len().await, 1);
    assert!(api.requests().is_empty());

    handle.set_online(true);
    wait_for_drain(&service).await;

    let requests = api.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, HttpMethod::Post);
    assert_eq!(requests[0].path, "/api/parking/start");
    assert_eq!(requests[0].body, json!({"zone": "A"}));

    // subscribers saw the empty start, the enqueue, and the emptied queue
    let seen = snapshots.lock().unwrap().clone();
    assert_eq!(seen.first(), Some(&0));
    assert!(seen.contains(&1));
    assert_eq!(seen.last(), Some(&0));
}

#[tokio::test]
async fn test_online_enqueue_drains_in_background() {
    let api = RecordingApi::new();
    let store = Arc::new(MemoryStore::new());
    let (monitor, _handle) = WatchMonitor::new(true);
    let service = OfflineQueue::start(&QueueConfig::default(), store, monitor, api.clone()).await;

    service
        .enqueue(ActionDomain::Report, "create", json!({"title": "broken light"}))
        .await;

    wait_for_drain(&service).await;

    let requests = api.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/api/reports");
}

#[tokio::test]
async fn test_restart_restores_pending_actions() {
    let api = RecordingApi::new();
    let store = Arc::new(MemoryStore::new());

    let (monitor, _handle) = WatchMonitor::new(false);
    let first =
        OfflineQueue::start(&QueueConfig::default(), store.clone(), monitor, api.clone()).await;

    let report_id = first
        .enqueue(ActionDomain::Report, "create", json!({"title": "x"}))
        .await;
    let topup_id = first
        .enqueue(ActionDomain::Wallet, "topup", json!({"amount": 10}))
        .await;
    first.shutdown().await;

    // Simulated restart: fresh service over the same store, still offline
    let (monitor, _handle) = WatchMonitor::new(false);
    let second = OfflineQueue::start(&QueueConfig::default(), store, monitor, api.clone()).await;

    let pending = second.pending().await;
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].id, report_id);
    assert_eq!(pending[1].id, topup_id);
    assert_eq!(pending[0].retry_count, 0);
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn test_startup_drain_replays_restored_actions() {
    let api = RecordingApi::new();
    let store = Arc::new(MemoryStore::new());

    let (monitor, _handle) = WatchMonitor::new(false);
    let first =
        OfflineQueue::start(&QueueConfig::default(), store.clone(), monitor, api.clone()).await;
    first
        .enqueue(ActionDomain::Parking, "start", json!({"zone": "B"}))
        .await;
    first
        .enqueue(ActionDomain::Parking, "extend", json!({"session": "s2"}))
        .await;
    first.shutdown().await;

    // Next launch happens with connectivity already up
    let (monitor, _handle) = WatchMonitor::new(true);
    let second = OfflineQueue::start(&QueueConfig::default(), store, monitor, api.clone()).await;

    wait_for_drain(&second).await;

    let paths: Vec<String> = api.requests().iter().map(|r| r.path.clone()).collect();
    assert_eq!(paths, vec!["/api/parking/start", "/api/parking/extend"]);
}

#[tokio::test]
async fn test_dequeue_unknown_id_is_noop() {
    let api = RecordingApi::new();
    let store = Arc::new(MemoryStore::new());
    let (monitor, _handle) = WatchMonitor::new(false);
    let service = OfflineQueue::start(&QueueConfig::default(), store, monitor, api).await;

    let id = service
        .enqueue(ActionDomain::Report, "create", json!({}))
        .await;

    service.dequeue("1700000000000-missing00").await;
    assert_eq!(service.len().await, 1);

    service.dequeue(&id).await;
    assert!(service.is_empty().await);
}

#[tokio::test]
async fn test_force_sync_offline_returns_empty_outcome() {
    let api = RecordingApi::new();
    let store = Arc::new(MemoryStore::new());
    let (monitor, _handle) = WatchMonitor::new(false);
    let service = OfflineQueue::start(&QueueConfig::default(), store, monitor, api.clone()).await;

    service
        .enqueue(ActionDomain::Wallet, "topup", json!({"amount": 50}))
        .await;

    assert_eq!(service.force_sync().await, DrainOutcome::default());
    assert!(api.requests().is_empty());
    assert_eq!(service.len().await, 1);
    assert!(!service.is_online());
}

#[tokio::test]
async fn test_clear_drops_pending_actions() {
    let api = RecordingApi::new();
    let store = Arc::new(MemoryStore::new());
    let (monitor, _handle) = WatchMonitor::new(false);
    let service = OfflineQueue::start(&QueueConfig::default(), store, monitor, api).await;

    service.enqueue(ActionDomain::Report, "create", json!({})).await;
    service
        .enqueue(ActionDomain::Report, "update", json!({"id": "r1"}))
        .await;

    let snapshots = Arc::new(Mutex::new(Vec::new()));
    let sink = snapshots.clone();
    let _subscription = service
        .subscribe(Box::new(move |snapshot| {
            sink.lock().unwrap().push(snapshot.len());
        }))
        .await;

    service.clear().await;

    assert!(service.is_empty().await);
    assert_eq!(snapshots.lock().unwrap().last(), Some(&0));
}

#[tokio::test]
async fn test_shutdown_stops_the_worker() {
    let api = RecordingApi::new();
    let store = Arc::new(MemoryStore::new());
    let (monitor, _handle) = WatchMonitor::new(false);
    let service = OfflineQueue::start(&QueueConfig::default(), store, monitor, api).await;

    tokio::time::timeout(Duration::from_secs(1), service.shutdown())
        .await
        .expect("worker did not stop");
}
