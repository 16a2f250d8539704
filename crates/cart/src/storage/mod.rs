//! Key-value storage backing the persisted cart.
//!
//! The cart only needs two operations on its storage: read the raw text at a
//! key, and overwrite it. Backends implement [`KeyValueStorage`]; the store
//! holds them as `Arc<dyn KeyValueStorage>` so the backend is picked at
//! startup.
//!
//! # Backends
//!
//! - [`MemoryStorage`] - process-local map, for tests and throwaway sessions
//! - [`FileStorage`] - one file per key under a data directory

use async_trait::async_trait;
use thiserror::Error;

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The backend cannot serve requests right now.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Asynchronous string key-value storage.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored at `key`, or `None` if nothing was ever written.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the value stored at `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
