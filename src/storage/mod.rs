//! Persistent storage abstraction for the offline queue.
//!
//! The queue serializes its whole pending sequence as one blob under a
//! single fixed key; no incremental format is defined. Hosts implement
//! [`PersistedStore`] over whatever durable storage the platform offers
//! (preferences, app files, a keychain-backed store).

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading the blob failed
    #[error("storage read failed: {0}")]
    Read(String),

    /// Writing the blob failed
    #[error("storage write failed: {0}")]
    Write(String),
}

/// Durable key-value store holding one serialized blob per key.
///
/// # Thread Safety
///
/// Implementations must be thread-safe (`Send + Sync`) as they are shared
/// across async tasks.
///
/// # Durability
///
/// `set` replaces the previous blob atomically from the queue's point of
/// view; the queue never issues partial writes.
#[async_trait]
pub trait PersistedStore: Send + Sync {
    /// Fetch the blob stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the blob stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
