//! phonics-sc: record custom letter sounds from the microphone
//!
//! Captured audio is encoded as 16-bit PCM WAV and returned as a
//! [`phonics_storage::Recording`] ready to save under a sound key.

pub mod error;
pub mod recorder;

pub use error::CaptureError;
pub use recorder::{encode_wav, list_input_devices, AudioRecorder};
