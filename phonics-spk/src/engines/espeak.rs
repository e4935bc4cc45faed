//! espeak-ng speech engine
//!
//! Runs the `espeak-ng` binary once per utterance and captures the WAV it
//! writes to stdout.

use crate::engines::{SpeechEngine, Utterance, MAX_TEXT_LEN};
use crate::error::AudioError;
use crate::voice::VoiceCandidate;
use async_trait::async_trait;
use bytes::Bytes;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

const DEFAULT_BINARY: &str = "espeak-ng";
/// espeak-ng's normal speaking speed in words per minute
const BASE_WPM: f32 = 175.0;
const MAX_AUDIO_SIZE: usize = 10 * 1024 * 1024;

pub struct EspeakEngine {
    binary: String,
    available: bool,
}

impl EspeakEngine {
    pub fn new() -> Self {
        Self::with_binary(DEFAULT_BINARY)
    }

    /// Use a specific espeak-compatible binary (e.g. "espeak").
    pub fn with_binary(binary: impl Into<String>) -> Self {
        let binary = binary.into();
        let available = std::process::Command::new(&binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false);

        if !available {
            warn!("{} not found; speech fallback disabled", binary);
        }
        Self { binary, available }
    }
}

impl Default for EspeakEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip control and shell metacharacters and cap the length.
pub(crate) fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() && !matches!(c, ';' | '|' | '&' | '$' | '`' | '<' | '>'))
        .take(MAX_TEXT_LEN)
        .collect::<String>()
        .trim()
        .trim_start_matches('-')
        .to_string()
}

/// Command-line arguments for an utterance, text excluded.
pub(crate) fn espeak_args(utterance: &Utterance) -> Vec<String> {
    let params = &utterance.params;
    // espeak-ng resolves voices by language identifier, not display name
    let voice = match &utterance.voice {
        Some(voice) => voice.lang.clone(),
        None => utterance.language.replace('_', "-").to_ascii_lowercase(),
    };

    let speed = (BASE_WPM * params.rate).round().clamp(80.0, 450.0) as u32;
    // 0-99, 50 is normal
    let pitch = (50.0 * params.pitch).round().clamp(0.0, 99.0) as u32;
    // 0-200, 100 is normal
    let amplitude = (100.0 * params.volume).round().clamp(0.0, 200.0) as u32;

    vec![
        "-v".to_string(),
        voice,
        "-s".to_string(),
        speed.to_string(),
        "-p".to_string(),
        pitch.to_string(),
        "-a".to_string(),
        amplitude.to_string(),
        "--stdout".to_string(),
    ]
}

/// Parse the table printed by `espeak-ng --voices`.
pub(crate) fn parse_voices(listing: &str) -> Vec<VoiceCandidate> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut columns = line.split_whitespace();
            let lang = columns.nth(1)?;
            let name = columns.nth(1)?;
            if name.len() > 256 || name.chars().any(char::is_control) {
                warn!("Skipping malformed voice entry: {:?}", line);
                return None;
            }
            Some(VoiceCandidate::new(name, lang))
        })
        .collect()
}

#[async_trait]
impl SpeechEngine for EspeakEngine {
    async fn synthesize(&self, utterance: &Utterance) -> Result<Bytes, AudioError> {
        if !self.available {
            return Err(AudioError::SynthesisUnavailable(format!("{} not available", self.binary)));
        }

        let text = sanitize_text(&utterance.text);
        if text.is_empty() {
            return Err(AudioError::SynthesisUnavailable("Text is empty after sanitization".to_string()));
        }

        let args = espeak_args(utterance);
        debug!("{} {:?} {:?}", self.binary, args, text);

        let output = Command::new(&self.binary)
            .args(&args)
            .arg(&text)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AudioError::SynthesisUnavailable(format!("Failed to run {}: {}", self.binary, e)))?;

        if !output.status.success() {
            return Err(AudioError::SynthesisUnavailable(format!(
                "{} failed: {}",
                self.binary,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        if output.stdout.is_empty() {
            return Err(AudioError::Decode(format!("{} produced no audio", self.binary)));
        }
        if output.stdout.len() > MAX_AUDIO_SIZE {
            return Err(AudioError::Decode(format!(
                "Synthesized clip too large ({} bytes, max {})",
                output.stdout.len(),
                MAX_AUDIO_SIZE
            )));
        }

        Ok(Bytes::from(output.stdout))
    }

    async fn list_voices(&self) -> Result<Vec<VoiceCandidate>, AudioError> {
        if !self.available {
            return Ok(Vec::new());
        }

        let output = Command::new(&self.binary)
            .arg("--voices")
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AudioError::SynthesisUnavailable(format!("Failed to list voices: {}", e)))?;

        if !output.status.success() {
            return Ok(Vec::new());
        }
        Ok(parse_voices(&String::from_utf8_lossy(&output.stdout)))
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn name(&self) -> &str {
        &self.binary
    }
}
