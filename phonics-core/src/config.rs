//! Configuration for the phonics keyboard
//!
//! Every section carries `#[serde(default)]`, so a config file only needs
//! the keys it changes.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhonicsConfig {
    pub audio: AudioConfig,
    pub voice: VoiceConfig,
    pub playback: PlaybackConfig,
    pub storage: StorageConfig,
}

/// Static sound files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Directory or http(s) base URL holding one file per sound key
    pub asset_root: String,

    /// File extension including the dot
    pub extension: String,

    /// Appended as `?v=` so stale cached files are refetched
    pub cache_version: u32,

    /// Playback volume (0.0-1.0)
    pub volume: f32,
}

/// Speech synthesis voice and prosody
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Target language tag, e.g. "en-GB"
    pub language: String,

    /// First choice, matched by name containment
    pub preferred_female: String,

    /// Second choice, matched by name containment
    pub preferred_male: String,

    /// Regional voice used only when nothing else in the region exists
    pub excluded: String,

    /// Speaking rate, 1.0 is the engine's normal speed
    pub rate: f32,

    /// Pitch, 1.0 is the engine's normal pitch (0.0-2.0)
    pub pitch: f32,

    /// Speech volume (0.0-1.0)
    pub volume: f32,
}

/// Orchestrator timing and fallback policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Bound on obtaining a playable source for one tier
    pub load_timeout_ms: u64,

    /// Longest a started clip may play before it is cut off
    pub playback_timeout_ms: u64,

    /// Speak multi-letter graphemes as written when their sound file fails
    pub synthesize_multi_letter: bool,
}

/// Custom recording persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: PathBuf,
    pub tree: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            asset_root: "audio/phonics/en-GB".to_string(),
            extension: ".mp3".to_string(),
            cache_version: 3,
            volume: 1.0,
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            language: "en-GB".to_string(),
            preferred_female: "Google UK English Female".to_string(),
            preferred_male: "Google UK English Male".to_string(),
            excluded: "Daniel".to_string(),
            rate: 0.85,
            pitch: 1.05,
            volume: 1.0,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            load_timeout_ms: 3_000,
            playback_timeout_ms: 15_000,
            synthesize_multi_letter: true,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let path = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("phonics")
            .join("recordings");

        Self {
            path,
            tree: "phonics_recordings".to_string(),
        }
    }
}

const MAX_TIMEOUT_MS: u64 = 120_000;

impl PhonicsConfig {
    /// Load configuration from a TOML or JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if path.to_string_lossy().contains("..") {
            return Err(Error::Configuration(format!(
                "Config path cannot contain '..': {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration, trying JSON first and then TOML
    pub fn from_str(content: &str) -> Result<Self, Error> {
        if let Ok(config) = serde_json::from_str::<PhonicsConfig>(content) {
            return Ok(config);
        }

        toml::from_str::<PhonicsConfig>(content)
            .map_err(|e| Error::Serialization(format!("Unrecognised config format: {}", e)))
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from `PHONICS_*` environment variables
    pub fn apply_env(&mut self) {
        if let Ok(root) = std::env::var("PHONICS_ASSET_ROOT") {
            self.audio.asset_root = root;
        }

        if let Ok(path) = std::env::var("PHONICS_STORE_PATH") {
            self.storage.path = PathBuf::from(path);
        }

        if let Ok(lang) = std::env::var("PHONICS_VOICE_LANG") {
            self.voice.language = lang;
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.audio.validate()?;
        self.voice.validate()?;
        self.playback.validate()?;
        self.storage.validate()?;
        Ok(())
    }
}

impl AudioConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.asset_root.trim().is_empty() {
            return Err(Error::Configuration("audio.asset_root cannot be empty".to_string()));
        }

        if self.asset_root.contains("..") {
            return Err(Error::Configuration("audio.asset_root cannot contain '..'".to_string()));
        }

        if !self.extension.starts_with('.') || self.extension.len() < 2 {
            return Err(Error::Configuration(format!(
                "audio.extension must look like \".mp3\", got {:?}",
                self.extension
            )));
        }

        if !(0.0..=1.0).contains(&self.volume) {
            return Err(Error::Configuration("audio.volume must be between 0.0 and 1.0".to_string()));
        }

        Ok(())
    }
}

impl VoiceConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.language.is_empty() {
            return Err(Error::Configuration("voice.language cannot be empty".to_string()));
        }

        if self.language.len() > 32 {
            return Err(Error::Configuration("voice.language too long (max 32 chars)".to_string()));
        }

        if !self
            .language
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::Configuration(
                "voice.language contains invalid characters (only alphanumeric, '-' and '_' allowed)"
                    .to_string(),
            ));
        }

        for name in [&self.preferred_female, &self.preferred_male, &self.excluded] {
            if name.len() > 256 || name.chars().any(|c| c.is_control()) {
                return Err(Error::Configuration(format!("Invalid voice name: {:?}", name)));
            }
        }

        if !(self.rate > 0.0 && self.rate <= 10.0) {
            return Err(Error::Configuration("voice.rate must be in (0.0, 10.0]".to_string()));
        }

        if !(0.0..=2.0).contains(&self.pitch) {
            return Err(Error::Configuration("voice.pitch must be between 0.0 and 2.0".to_string()));
        }

        if !(0.0..=1.0).contains(&self.volume) {
            return Err(Error::Configuration("voice.volume must be between 0.0 and 1.0".to_string()));
        }

        Ok(())
    }
}

impl PlaybackConfig {
    pub fn validate(&self) -> Result<(), Error> {
        for (name, value) in [
            ("playback.load_timeout_ms", self.load_timeout_ms),
            ("playback.playback_timeout_ms", self.playback_timeout_ms),
        ] {
            if value == 0 || value > MAX_TIMEOUT_MS {
                return Err(Error::Configuration(format!(
                    "{} must be between 1 and {}",
                    name, MAX_TIMEOUT_MS
                )));
            }
        }

        Ok(())
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.path.to_string_lossy().contains("..") {
            return Err(Error::Configuration("storage.path cannot contain '..'".to_string()));
        }

        if self.tree.is_empty() {
            return Err(Error::Configuration("storage.tree cannot be empty".to_string()));
        }

        Ok(())
    }
}
