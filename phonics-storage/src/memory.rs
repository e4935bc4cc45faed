//! In-memory recording store

use crate::error::StorageError;
use crate::recording::{canonical_key, Recording, RecordingStore};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeSet;

/// Recording store that lives for the process only.
#[derive(Default)]
pub struct MemoryRecordingStore {
    entries: DashMap<String, Recording>,
}

impl MemoryRecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl RecordingStore for MemoryRecordingStore {
    async fn save(&self, key: &str, recording: Recording) -> Result<(), StorageError> {
        self.entries.insert(canonical_key(key)?, recording);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Recording>, StorageError> {
        let key = canonical_key(key)?;
        Ok(self.entries.get(&key).map(|entry| entry.value().clone()))
    }

    async fn list_keys(&self) -> Result<BTreeSet<String>, StorageError> {
        Ok(self.entries.iter().map(|entry| entry.key().clone()).collect())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(&canonical_key(key)?);
        Ok(())
    }
}
