//! Custom recording store contract

use crate::error::StorageError;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Longest key accepted; real sound keys are at most three letters.
const MAX_KEY_LEN: usize = 16;

/// A user-recorded sound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub audio: Bytes,
    pub mime: String,
    pub recorded_at: DateTime<Utc>,
}

impl Recording {
    pub fn new(audio: impl Into<Bytes>, mime: impl Into<String>) -> Self {
        Self {
            audio: audio.into(),
            mime: mime.into(),
            recorded_at: Utc::now(),
        }
    }

    pub fn wav(audio: impl Into<Bytes>) -> Self {
        Self::new(audio, "audio/wav")
    }

    pub fn is_empty(&self) -> bool {
        self.audio.is_empty()
    }
}

/// Persistent key -> recording store.
///
/// Keys are sound keys; implementations uppercase them before use, so
/// "ai" and "AI" address the same entry. Saving an existing key replaces
/// it, deleting a missing key succeeds.
#[async_trait]
pub trait RecordingStore: Send + Sync {
    async fn save(&self, key: &str, recording: Recording) -> Result<(), StorageError>;

    async fn get(&self, key: &str) -> Result<Option<Recording>, StorageError>;

    async fn list_keys(&self) -> Result<BTreeSet<String>, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Uppercase and validate a store key.
pub fn canonical_key(key: &str) -> Result<String, StorageError> {
    let trimmed = key.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_KEY_LEN {
        return Err(StorageError::InvalidKey(key.to_string()));
    }

    if !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(StorageError::InvalidKey(key.to_string()));
    }

    Ok(trimmed.to_ascii_uppercase())
}
