//! Audio output
//!
//! An [`AudioOutput`] turns a complete encoded clip into a running
//! [`Playback`]: a handle that can halt it plus a signal that fires when
//! it finishes on its own.

pub mod device;

pub use device::RodioOutput;

use crate::error::AudioError;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Control over one playing clip
pub trait PlaybackHandle: Send + Sync {
    /// Halt playback and release the clip. Calling it again does nothing.
    fn stop(&self);
}

/// A clip that has started playing
pub struct Playback {
    pub handle: Arc<dyn PlaybackHandle>,
    /// Resolves when the clip ends by itself, or with the error that ended it
    pub finished: oneshot::Receiver<Result<(), AudioError>>,
}

impl Playback {
    pub fn new(handle: Arc<dyn PlaybackHandle>, finished: oneshot::Receiver<Result<(), AudioError>>) -> Self {
        Self { handle, finished }
    }
}

#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Decode `clip` and start playing it at `volume` (0.0-1.0).
    ///
    /// Fails before anything is heard if the clip cannot be decoded or the
    /// device refuses it.
    async fn start(&self, clip: Bytes, volume: f32) -> Result<Playback, AudioError>;

    /// Prime the device so the first real clip starts without delay.
    async fn warm_up(&self) -> Result<(), AudioError> {
        Ok(())
    }

    fn name(&self) -> &str;
}
