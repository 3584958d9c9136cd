//! In-memory implementation of the persisted store.
//!
//! Contents are lost when the process exits. Used by tests and by hosts
//! that mirror the blob into platform storage themselves.

use async_trait::async_trait;
use dashmap::DashMap;

use super::{PersistedStore, StorageError};

/// In-memory `PersistedStore` backed by a `DashMap`.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistedStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).map(|value| value.clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
