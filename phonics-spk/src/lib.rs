//! phonics-spk: sound resolution and playback for the phonics keyboard
//!
//! Provides:
//! - A three-tier playback orchestrator (custom recording, bundled file, speech)
//! - A single-session guarantee: a new request always stops the previous one
//! - espeak-ng and closure-backed speech engines with regional voice selection
//! - Default-device output through rodio

pub mod error;
pub mod engines;
pub mod output;
pub mod assets;
pub mod voice;
pub mod outcome;
mod session;
pub mod orchestrator;

pub use error::AudioError;
pub use engines::{CustomSpeechEngine, EspeakEngine, SpeechEngine, SpeechParams, Utterance};
pub use output::{AudioOutput, Playback, PlaybackHandle, RodioOutput};
pub use assets::{asset_source, AssetResolver, AssetSource, FsAssets, HttpAssets};
pub use voice::{select_voice, VoiceCandidate, VoiceDirectory, VoicePolicy};
pub use outcome::{PlaybackOutcome, PlaybackState, Resolution, Tier, TierAttempt, TierResult};
pub use orchestrator::PlaybackOrchestrator;
