use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid grapheme: {0:?}")]
    InvalidGrapheme(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Playback device error: {0}")]
    PlaybackDevice(String),

    #[error("Speech synthesis unavailable: {0}")]
    SynthesisUnavailable(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, Error>;
