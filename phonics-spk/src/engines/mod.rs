//! Speech synthesis engines

pub mod espeak;
pub mod custom;

pub use custom::CustomSpeechEngine;
pub use espeak::EspeakEngine;

use crate::error::AudioError;
use crate::voice::VoiceCandidate;
use async_trait::async_trait;
use bytes::Bytes;
use phonics_core::config::VoiceConfig;
use serde::{Deserialize, Serialize};

/// Longest text accepted by the built-in engines
pub const MAX_TEXT_LEN: usize = 4096;

/// Rate, pitch and volume for one utterance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeechParams {
    /// Speaking rate multiplier, 1.0 is normal
    pub rate: f32,
    /// Pitch multiplier, 1.0 is normal
    pub pitch: f32,
    /// 0.0 to 1.0
    pub volume: f32,
}

impl SpeechParams {
    pub fn from_config(config: &VoiceConfig) -> Self {
        Self {
            rate: config.rate,
            pitch: config.pitch,
            volume: config.volume,
        }
    }

    pub fn validate(&self) -> Result<(), AudioError> {
        if !(self.rate > 0.0 && self.rate <= 10.0) {
            return Err(AudioError::Config(format!("rate {} outside (0.0, 10.0]", self.rate)));
        }
        if !(0.0..=2.0).contains(&self.pitch) {
            return Err(AudioError::Config(format!("pitch {} outside 0.0..=2.0", self.pitch)));
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(AudioError::Config(format!("volume {} outside 0.0..=1.0", self.volume)));
        }
        Ok(())
    }
}

impl Default for SpeechParams {
    fn default() -> Self {
        Self::from_config(&VoiceConfig::default())
    }
}

/// A single synthesis request
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// Voice to use; `None` leaves the choice to the engine
    pub voice: Option<VoiceCandidate>,
    /// Language tag used when no voice was selected
    pub language: String,
    pub params: SpeechParams,
}

impl Utterance {
    pub fn new(text: impl Into<String>, language: impl Into<String>, params: SpeechParams) -> Self {
        Self {
            text: text.into(),
            voice: None,
            language: language.into(),
            params,
        }
    }

    pub fn with_voice(mut self, voice: Option<VoiceCandidate>) -> Self {
        self.voice = voice;
        self
    }
}

/// Trait for speech engines
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Render an utterance to a complete audio clip (WAV unless stated otherwise)
    async fn synthesize(&self, utterance: &Utterance) -> Result<Bytes, AudioError>;

    /// Voices the engine can speak with
    async fn list_voices(&self) -> Result<Vec<VoiceCandidate>, AudioError>;

    fn is_available(&self) -> bool;

    fn name(&self) -> &str;
}
