//! File-backed storage backend.
//!
//! Each key maps to `<root>/<percent-encoded key>.json`. Writes land in a
//! sibling `.tmp` file, which is flushed to disk before being renamed over the
//! target, so readers see either the old value or the new one, never a
//! partial write.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{KeyValueStorage, StorageError};

/// Key-value storage rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Open storage rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|source| StorageError::Io {
                key: root.display().to_string(),
                source,
            })?;
        debug!(root = %root.display(), "Opened file storage");
        Ok(Self { root })
    }

    /// Directory holding the stored values.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", urlencoding::encode(key)))
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_owned(),
                source,
            }),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let io_err = |source| StorageError::Io {
            key: key.to_owned(),
            source,
        };

        let mut file = fs::File::create(&tmp).await.map_err(io_err)?;
        file.write_all(value.as_bytes()).await.map_err(io_err)?;
        file.sync_all().await.map_err(io_err)?;
        drop(file);

        fs::rename(&tmp, &path).await.map_err(io_err)?;
        debug!(key, bytes = value.len(), "Wrote file storage entry");
        Ok(())
    }
}
