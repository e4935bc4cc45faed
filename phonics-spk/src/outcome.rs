//! Playback states and per-request outcomes

use phonics_core::{Grapheme, PhonemeKey};
use serde::Serialize;
use std::fmt;

/// Sound source, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// User recording from the recording store
    CustomRecording,
    /// Bundled phoneme sound file
    StaticFile,
    /// Synthesized speech
    Speech,
}

impl Tier {
    pub const ORDER: [Tier; 3] = [Tier::CustomRecording, Tier::StaticFile, Tier::Speech];
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::CustomRecording => "custom recording",
            Tier::StaticFile => "static file",
            Tier::Speech => "speech",
        };
        f.write_str(name)
    }
}

/// What the orchestrator is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "tier", rename_all = "snake_case")]
pub enum PlaybackState {
    #[default]
    Idle,
    /// Acquiring the source for a tier
    Resolving(Tier),
    Playing(Tier),
}

impl PlaybackState {
    pub fn is_idle(&self) -> bool {
        matches!(self, PlaybackState::Idle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "reason", rename_all = "snake_case")]
pub enum TierResult {
    Played,
    /// The tier had nothing for this sound
    Missing,
    Failed(String),
    /// The tier does not apply to this request
    Skipped(String),
    /// A newer request or an explicit stop ended this one
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierAttempt {
    pub tier: Tier,
    pub result: TierResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "resolution", content = "tier", rename_all = "snake_case")]
pub enum Resolution {
    Played(Tier),
    /// Every tier failed; nothing was heard
    Exhausted,
    /// The input is not a playable grapheme
    Rejected,
    /// A newer request or an explicit stop took over
    Superseded,
}

/// Result of one play or speak request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackOutcome {
    pub input: String,
    #[serde(serialize_with = "serialize_display")]
    pub grapheme: Option<Grapheme>,
    #[serde(serialize_with = "serialize_display")]
    pub key: Option<PhonemeKey>,
    pub attempts: Vec<TierAttempt>,
    pub resolution: Resolution,
}

impl PlaybackOutcome {
    pub(crate) fn rejected(input: &str) -> Self {
        Self {
            input: input.to_string(),
            grapheme: None,
            key: None,
            attempts: Vec::new(),
            resolution: Resolution::Rejected,
        }
    }

    pub fn played(&self) -> bool {
        matches!(self.resolution, Resolution::Played(_))
    }

    /// Tier that was heard, if any
    pub fn tier(&self) -> Option<Tier> {
        match self.resolution {
            Resolution::Played(tier) => Some(tier),
            _ => None,
        }
    }

    pub fn attempted(&self, tier: Tier) -> bool {
        self.attempts.iter().any(|a| a.tier == tier)
    }

    pub fn result_for(&self, tier: Tier) -> Option<&TierResult> {
        self.attempts.iter().find(|a| a.tier == tier).map(|a| &a.result)
    }
}

fn serialize_display<T: fmt::Display, S: serde::Serializer>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.collect_str(v),
        None => serializer.serialize_none(),
    }
}
