//! Connectivity state abstraction.
//!
//! The queue only needs two things from the platform: the current
//! online/offline boolean and a way to observe transitions. [`WatchMonitor`]
//! is the shipped implementation; the host forwards its own network events
//! through the paired [`ConnectivityHandle`].

use std::sync::Arc;

use tokio::sync::watch;

/// Source of the device's link state.
pub trait ConnectivityMonitor: Send + Sync {
    /// Current link state.
    fn is_online(&self) -> bool;

    /// Receiver that yields on every state transition.
    fn watch(&self) -> watch::Receiver<bool>;
}

/// Connectivity monitor fed by the host platform.
pub struct WatchMonitor {
    state: watch::Receiver<bool>,
}

/// Writer side of a [`WatchMonitor`].
///
/// Keep the handle alive for as long as the monitor is in use; dropping it
/// closes the channel and stops transition delivery.
pub struct ConnectivityHandle {
    state: watch::Sender<bool>,
}

impl WatchMonitor {
    /// Create a monitor together with the handle that drives it.
    pub fn new(initially_online: bool) -> (Arc<Self>, ConnectivityHandle) {
        let (tx, rx) = watch::channel(initially_online);
        (Arc::new(Self { state: rx }), ConnectivityHandle { state: tx })
    }
}

impl ConnectivityMonitor for WatchMonitor {
    fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    fn watch(&self) -> watch::Receiver<bool> {
        self.state.clone()
    }
}

impl ConnectivityHandle {
    /// Record a link state change.
    ///
    /// Platform layers often re-report the current state; observers are only
    /// woken on actual transitions.
    pub fn set_online(&self, online: bool) {
        let changed = self.state.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });

        if changed {
            tracing::info!(online, "Connectivity changed");
        }
    }
}
