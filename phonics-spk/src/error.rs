//! Error types for phonics-spk

use phonics_core::Error as CoreError;
use phonics_storage::StorageError;
use thiserror::Error;

/// Audio resolution and playback errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Invalid grapheme: {0:?}")]
    InvalidGrapheme(String),

    #[error("Recording store unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Playback device error: {0}")]
    PlaybackDevice(String),

    #[error("Speech synthesis unavailable: {0}")]
    SynthesisUnavailable(String),

    #[error("Sound asset not found: {0}")]
    AssetNotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl From<StorageError> for AudioError {
    fn from(err: StorageError) -> Self {
        AudioError::StorageUnavailable(err.to_string())
    }
}

impl From<reqwest::Error> for AudioError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AudioError::Timeout(err.to_string())
        } else {
            AudioError::Network(err.to_string())
        }
    }
}

impl From<AudioError> for CoreError {
    fn from(err: AudioError) -> Self {
        match err {
            AudioError::InvalidGrapheme(input) => CoreError::InvalidGrapheme(input),
            AudioError::StorageUnavailable(msg) => CoreError::Storage(msg),
            AudioError::PlaybackDevice(msg) | AudioError::Decode(msg) => CoreError::PlaybackDevice(msg),
            AudioError::SynthesisUnavailable(msg) => CoreError::SynthesisUnavailable(msg),
            AudioError::Timeout(msg) => CoreError::Timeout(msg),
            AudioError::Config(msg) => CoreError::Configuration(msg),
            AudioError::Io(e) => CoreError::Io(e),
            AudioError::Core(e) => e,
            other => CoreError::PlaybackDevice(other.to_string()),
        }
    }
}
