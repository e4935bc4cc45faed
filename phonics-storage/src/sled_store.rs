//! Durable recording store on sled

use crate::error::StorageError;
use crate::recording::{canonical_key, Recording, RecordingStore};
use async_trait::async_trait;
use phonics_core::config::StorageConfig;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Recording store backed by a sled tree.
///
/// The database is opened on first use; concurrent first calls share a
/// single open.
pub struct SledRecordingStore {
    path: PathBuf,
    tree_name: String,
    handle: OnceCell<(sled::Db, sled::Tree)>,
}

impl SledRecordingStore {
    pub fn new(path: impl Into<PathBuf>, tree_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            tree_name: tree_name.into(),
            handle: OnceCell::new(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.path.clone(), config.tree.clone())
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Whether the database has been opened yet
    pub fn is_open(&self) -> bool {
        self.handle.initialized()
    }

    async fn tree(&self) -> Result<&sled::Tree, StorageError> {
        let (_, tree) = self
            .handle
            .get_or_try_init(|| async {
                let path = self.path.clone();
                let tree_name = self.tree_name.clone();
                // sled::open touches the filesystem; keep it off the runtime threads
                let opened = tokio::task::spawn_blocking(move || {
                    let db = sled::open(&path).map_err(|e| {
                        StorageError::Unavailable(format!("Failed to open {}: {}", path.display(), e))
                    })?;
                    let tree = db.open_tree(&tree_name)?;
                    Ok::<_, StorageError>((db, tree))
                })
                .await
                .map_err(|e| StorageError::Unavailable(format!("Store open task failed: {}", e)))??;
                info!("Opened recording store at {:?} (tree {})", self.path, self.tree_name);
                Ok::<_, StorageError>(opened)
            })
            .await?;
        Ok(tree)
    }
}

#[async_trait]
impl RecordingStore for SledRecordingStore {
    async fn save(&self, key: &str, recording: Recording) -> Result<(), StorageError> {
        let key = canonical_key(key)?;
        let tree = self.tree().await?;
        let encoded = bincode::serialize(&recording)?;

        tree.insert(key.as_bytes(), encoded)?;
        tree.flush_async().await?;
        debug!("Saved recording {} ({} bytes)", key, recording.audio.len());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Recording>, StorageError> {
        let key = canonical_key(key)?;
        let tree = self.tree().await?;

        match tree.get(key.as_bytes())? {
            Some(raw) => Ok(Some(bincode::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    async fn list_keys(&self) -> Result<BTreeSet<String>, StorageError> {
        let tree = self.tree().await?;
        let mut keys = BTreeSet::new();
        for key in tree.iter().keys() {
            keys.insert(String::from_utf8_lossy(&key?).into_owned());
        }
        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let key = canonical_key(key)?;
        let tree = self.tree().await?;

        if tree.remove(key.as_bytes())?.is_some() {
            tree.flush_async().await?;
            debug!("Deleted recording {}", key);
        }
        Ok(())
    }
}
