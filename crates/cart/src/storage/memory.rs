//! In-memory storage backend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{KeyValueStorage, StorageError};

/// Process-local key-value map.
///
/// Clones share the same map, so a test can keep one clone to inspect what
/// the cart wrote and hand another to a fresh store to simulate a restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage pre-seeded with one entry.
    #[must_use]
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let entries = HashMap::from([(key.into(), value.into())]);
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    /// Whether no key has been written.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .await
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
