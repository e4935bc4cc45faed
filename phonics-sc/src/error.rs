//! Error types for phonics-sc

use phonics_core::Error as CoreError;
use thiserror::Error;

/// Microphone capture errors
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Audio device error: {0}")]
    Device(String),

    #[error("Audio capture error: {0}")]
    Capture(String),

    #[error("WAV encode error: {0}")]
    Encode(String),

    #[error("Already recording")]
    AlreadyRecording,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl From<hound::Error> for CaptureError {
    fn from(err: hound::Error) -> Self {
        CaptureError::Encode(err.to_string())
    }
}

impl From<CaptureError> for CoreError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::Io(e) => CoreError::Io(e),
            CaptureError::Core(e) => e,
            other => CoreError::PlaybackDevice(format!("Capture error: {}", other)),
        }
    }
}
