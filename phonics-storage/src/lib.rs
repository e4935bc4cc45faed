//! phonics-storage: user-recorded sound overrides
//!
//! A recording saved under a sound key ("C", "AI", ...) takes priority
//! over the bundled sound file for that key.

pub mod error;
pub mod recording;
pub mod sled_store;
pub mod memory;

pub use error::StorageError;
pub use recording::{canonical_key, Recording, RecordingStore};
pub use sled_store::SledRecordingStore;
pub use memory::MemoryRecordingStore;
