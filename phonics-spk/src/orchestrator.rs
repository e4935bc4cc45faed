//! Phoneme playback orchestration
//!
//! A request walks three tiers in fixed order and stops at the first one
//! that is heard:
//!
//! 1. the user's custom recording for the sound key
//! 2. the bundled sound file for the sound key
//! 3. synthesized speech of the grapheme's phonetic spelling
//!
//! Every request first stops whatever is playing, so two sounds never
//! overlap and a stale request can never start audio after a newer one.

use crate::assets::{asset_source, AssetSource};
use crate::engines::{EspeakEngine, SpeechEngine, SpeechParams, Utterance};
use crate::error::AudioError;
use crate::outcome::{PlaybackOutcome, PlaybackState, Resolution, Tier, TierAttempt, TierResult};
use crate::output::{AudioOutput, Playback, RodioOutput};
use crate::session::{SessionSlot, SessionTicket};
use crate::voice::{VoiceDirectory, VoicePolicy};
use bytes::Bytes;
use parking_lot::RwLock;
use phonics_core::{normalize, resolve_phoneme_key, speech_text, Grapheme, PhonemeKey, PhonicsConfig};
use phonics_storage::{RecordingStore, SledRecordingStore};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Per-request snapshot of the tunable settings
#[derive(Debug, Clone)]
struct Settings {
    volume: f32,
    language: String,
    speech: SpeechParams,
    load_timeout: Duration,
    playback_timeout: Duration,
    synthesize_multi_letter: bool,
}

impl Settings {
    fn from_config(config: &PhonicsConfig) -> Self {
        Self {
            volume: config.audio.volume,
            language: config.voice.language.clone(),
            speech: SpeechParams::from_config(&config.voice),
            load_timeout: Duration::from_millis(config.playback.load_timeout_ms),
            playback_timeout: Duration::from_millis(config.playback.playback_timeout_ms),
            synthesize_multi_letter: config.playback.synthesize_multi_letter,
        }
    }
}

enum Acquired<T> {
    Ready(T),
    Failed(AudioError),
    Cancelled,
}

pub struct PlaybackOrchestrator {
    config: RwLock<PhonicsConfig>,
    store: Arc<dyn RecordingStore>,
    assets: Arc<dyn AssetSource>,
    output: Arc<dyn AudioOutput>,
    speech: Arc<dyn SpeechEngine>,
    voices: VoiceDirectory,
    slot: SessionSlot,
}

impl PlaybackOrchestrator {
    pub fn new(
        config: PhonicsConfig,
        store: Arc<dyn RecordingStore>,
        assets: Arc<dyn AssetSource>,
        output: Arc<dyn AudioOutput>,
        speech: Arc<dyn SpeechEngine>,
    ) -> Result<Self, AudioError> {
        config.validate().map_err(|e| AudioError::Config(e.to_string()))?;
        let voices = VoiceDirectory::new(VoicePolicy::from_config(&config.voice));

        info!(
            "Playback orchestrator ready (output: {}, speech: {})",
            output.name(),
            speech.name()
        );
        Ok(Self {
            config: RwLock::new(config),
            store,
            assets,
            output,
            speech,
            voices,
            slot: SessionSlot::new(),
        })
    }

    /// Wire up the sled store, configured assets, default output device and espeak-ng.
    pub fn with_default_devices(config: PhonicsConfig) -> Result<Self, AudioError> {
        let store = Arc::new(SledRecordingStore::from_config(&config.storage));
        let assets = asset_source(&config.audio, Duration::from_millis(config.playback.load_timeout_ms))?;
        let output = Arc::new(RodioOutput::open_default()?);
        let speech = Arc::new(EspeakEngine::new());
        Self::new(config, store, assets, output, speech)
    }

    pub fn config(&self) -> PhonicsConfig {
        self.config.read().clone()
    }

    pub fn store(&self) -> &Arc<dyn RecordingStore> {
        &self.store
    }

    pub fn voices(&self) -> &VoiceDirectory {
        &self.voices
    }

    pub fn state(&self) -> PlaybackState {
        self.slot.state()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PlaybackState> {
        self.slot.subscribe()
    }

    /// True while a request owns the session
    pub fn is_active(&self) -> bool {
        self.slot.is_active()
    }

    fn settings(&self) -> Settings {
        Settings::from_config(&self.config.read())
    }

    /// Play the sound for a tapped letter or grapheme.
    ///
    /// Resolves once the sound has finished, every tier has failed, or a
    /// newer request (or [`stop`](Self::stop)) has taken over.
    pub async fn play(&self, input: &str) -> PlaybackOutcome {
        let grapheme = match normalize(input) {
            Some(grapheme) => grapheme,
            None => {
                warn!("Ignoring unplayable input {:?}", input);
                return PlaybackOutcome::rejected(input);
            }
        };
        let key = resolve_phoneme_key(&grapheme);
        let settings = self.settings();
        let mut ticket = self.slot.begin(PlaybackState::Resolving(Tier::CustomRecording));
        info!(session = ticket.id, grapheme = %grapheme, key = %key, "Playing");

        let mut attempts = Vec::with_capacity(Tier::ORDER.len());
        for tier in Tier::ORDER {
            if ticket.is_cancelled() {
                break;
            }

            let result = match tier {
                Tier::CustomRecording => self.play_recording(&key, &settings, &mut ticket).await,
                Tier::StaticFile => self.play_static(&key, &settings, &mut ticket).await,
                Tier::Speech => self.play_phoneme_speech(&grapheme, &settings, &mut ticket).await,
            };
            log_attempt(ticket.id, key.as_str(), tier, &result);

            let done = matches!(result, TierResult::Played | TierResult::Cancelled);
            attempts.push(TierAttempt { tier, result });
            if done {
                break;
            }
        }

        self.conclude(ticket, input, Some(grapheme), Some(key), attempts)
    }

    /// Speak arbitrary text (praise, word read-back) through the speech tier.
    ///
    /// Shares the session with [`play`](Self::play): it stops any running
    /// sound and is itself stopped by the next request.
    pub async fn speak_text(&self, text: &str, params: SpeechParams) -> PlaybackOutcome {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            warn!("Ignoring empty speech request");
            return PlaybackOutcome::rejected(text);
        }
        if let Err(e) = params.validate() {
            warn!("Ignoring speech request: {}", e);
            return PlaybackOutcome::rejected(text);
        }

        let settings = self.settings();
        let mut ticket = self.slot.begin(PlaybackState::Resolving(Tier::Speech));
        info!("Session {}: speaking {:?}", ticket.id, trimmed);

        let result = self.speak(trimmed.to_string(), params, &settings, &mut ticket).await;
        log_attempt(ticket.id, "text", Tier::Speech, &result);
        let attempts = vec![TierAttempt {
            tier: Tier::Speech,
            result,
        }];
        self.conclude(ticket, text, None, None, attempts)
    }

    /// Halt the active session, if any. Safe to call at any time.
    pub fn stop(&self) {
        if self.slot.stop() {
            info!("Playback stopped");
        }
    }

    /// Versioned locator of the bundled sound for an input.
    pub fn audio_path(&self, input: &str) -> Option<String> {
        let grapheme = normalize(input)?;
        Some(self.assets.locate(&resolve_phoneme_key(&grapheme)))
    }

    /// Prime the output device and load the voice list ahead of the first tap.
    pub async fn warm_up(&self) {
        if let Err(e) = self.output.warm_up().await {
            warn!("Audio warm-up failed: {}", e);
        }
        if self.speech.is_available() {
            if let Err(e) = self.refresh_voices().await {
                warn!("Voice list unavailable: {}", e);
            }
        }
    }

    /// Reload the speech engine's voices. Returns true when the selection changed.
    pub async fn refresh_voices(&self) -> Result<bool, AudioError> {
        self.voices.refresh(self.speech.as_ref()).await
    }

    /// Change speaking rate and/or volume for subsequent requests.
    ///
    /// Volume applies to recordings, sound files and speech alike.
    pub fn update_settings(&self, rate: Option<f32>, volume: Option<f32>) -> Result<(), AudioError> {
        let mut config = self.config.write();
        let mut updated = config.clone();
        if let Some(rate) = rate {
            updated.voice.rate = rate;
        }
        if let Some(volume) = volume {
            updated.voice.volume = volume;
            updated.audio.volume = volume;
        }
        updated.validate().map_err(|e| AudioError::Config(e.to_string()))?;

        info!(
            "Settings updated: rate {}, volume {}",
            updated.voice.rate, updated.audio.volume
        );
        *config = updated;
        Ok(())
    }

    fn conclude(
        &self,
        ticket: SessionTicket,
        input: &str,
        grapheme: Option<Grapheme>,
        key: Option<PhonemeKey>,
        attempts: Vec<TierAttempt>,
    ) -> PlaybackOutcome {
        let played = attempts.iter().find(|a| a.result == TierResult::Played).map(|a| a.tier);
        let resolution = match played {
            Some(tier) => Resolution::Played(tier),
            None if ticket.is_cancelled() => Resolution::Superseded,
            None => Resolution::Exhausted,
        };

        if resolution != Resolution::Superseded {
            self.slot.finish(ticket.id);
        }
        match resolution {
            Resolution::Exhausted => warn!("Session {}: no tier could play {:?}", ticket.id, input),
            Resolution::Superseded => info!("Session {}: superseded", ticket.id),
            _ => {}
        }

        PlaybackOutcome {
            input: input.to_string(),
            grapheme,
            key,
            attempts,
            resolution,
        }
    }

    async fn play_recording(&self, key: &PhonemeKey, settings: &Settings, ticket: &mut SessionTicket) -> TierResult {
        let lookup = async { self.store.get(key.as_str()).await.map_err(AudioError::from) };
        match self.acquire(Tier::CustomRecording, lookup, settings.load_timeout, ticket).await {
            Acquired::Ready(Some(recording)) if !recording.is_empty() => {
                self.play_clip(Tier::CustomRecording, recording.audio, settings.volume, settings, ticket)
                    .await
            }
            Acquired::Ready(_) => TierResult::Missing,
            // A broken store must never block the bundled sound
            Acquired::Failed(e) => TierResult::Failed(e.to_string()),
            Acquired::Cancelled => TierResult::Cancelled,
        }
    }

    async fn play_static(&self, key: &PhonemeKey, settings: &Settings, ticket: &mut SessionTicket) -> TierResult {
        match self.acquire(Tier::StaticFile, self.assets.fetch(key), settings.load_timeout, ticket).await {
            Acquired::Ready(clip) => {
                self.play_clip(Tier::StaticFile, clip, settings.volume, settings, ticket)
                    .await
            }
            Acquired::Failed(AudioError::AssetNotFound(_)) => TierResult::Missing,
            Acquired::Failed(e) => TierResult::Failed(e.to_string()),
            Acquired::Cancelled => TierResult::Cancelled,
        }
    }

    async fn play_phoneme_speech(&self, grapheme: &Grapheme, settings: &Settings, ticket: &mut SessionTicket) -> TierResult {
        if !grapheme.is_single_letter() && !settings.synthesize_multi_letter {
            return TierResult::Skipped("speech disabled for multi-letter graphemes".to_string());
        }
        self.speak(speech_text(grapheme), settings.speech, settings, ticket).await
    }

    async fn speak(&self, text: String, params: SpeechParams, settings: &Settings, ticket: &mut SessionTicket) -> TierResult {
        if !self.speech.is_available() {
            return TierResult::Failed(AudioError::SynthesisUnavailable(self.speech.name().to_string()).to_string());
        }

        if !self.voices.is_settled() {
            let refresh = self.voices.refresh(self.speech.as_ref());
            match self.acquire(Tier::Speech, refresh, settings.load_timeout, ticket).await {
                Acquired::Ready(_) => {}
                Acquired::Failed(e) => warn!("Voice list unavailable, using engine default: {}", e),
                Acquired::Cancelled => return TierResult::Cancelled,
            }
        }

        let utterance = Utterance::new(text, settings.language.clone(), params).with_voice(self.voices.selected());
        match self.acquire(Tier::Speech, self.speech.synthesize(&utterance), settings.load_timeout, ticket).await {
            // Engines apply the utterance volume themselves
            Acquired::Ready(clip) => self.play_clip(Tier::Speech, clip, 1.0, settings, ticket).await,
            Acquired::Failed(e) => TierResult::Failed(e.to_string()),
            Acquired::Cancelled => TierResult::Cancelled,
        }
    }

    /// Await a tier's source, bounded by the load timeout and cancellation.
    async fn acquire<T, F>(&self, tier: Tier, source: F, timeout: Duration, ticket: &mut SessionTicket) -> Acquired<T>
    where
        F: Future<Output = Result<T, AudioError>>,
    {
        self.slot.transition(ticket.id, PlaybackState::Resolving(tier));
        let acquired = tokio::select! {
            biased;
            _ = ticket.cancelled() => return Acquired::Cancelled,
            result = tokio::time::timeout(timeout, source) => match result {
                Ok(Ok(value)) => Acquired::Ready(value),
                Ok(Err(e)) => Acquired::Failed(e),
                Err(_) => Acquired::Failed(AudioError::Timeout(format!("{} not ready after {:?}", tier, timeout))),
            },
        };

        match acquired {
            // A source that failed because it was interrupted is not a tier failure
            Acquired::Failed(_) if ticket.is_cancelled() => Acquired::Cancelled,
            other => other,
        }
    }

    async fn play_clip(&self, tier: Tier, clip: Bytes, volume: f32, settings: &Settings, ticket: &mut SessionTicket) -> TierResult {
        let Playback { handle, finished } = match self
            .acquire(tier, self.output.start(clip, volume), settings.load_timeout, ticket)
            .await
        {
            Acquired::Ready(playback) => playback,
            Acquired::Failed(e) => return TierResult::Failed(e.to_string()),
            Acquired::Cancelled => return TierResult::Cancelled,
        };

        if !self.slot.attach(ticket.id, handle.clone(), PlaybackState::Playing(tier)) {
            handle.stop();
            return TierResult::Cancelled;
        }
        debug!("Session {}: {} playing", ticket.id, tier);

        let timeout = settings.playback_timeout;
        let result = tokio::select! {
            biased;
            // Whoever cancelled has already stopped the handle
            _ = ticket.cancelled() => return TierResult::Cancelled,
            finished = tokio::time::timeout(timeout, finished) => {
                // Stopping a clip may complete it; cancellation is set first
                if ticket.is_cancelled() {
                    return TierResult::Cancelled;
                }
                match finished {
                    Ok(Ok(Ok(()))) => TierResult::Played,
                    Ok(Ok(Err(e))) => TierResult::Failed(e.to_string()),
                    Ok(Err(_)) => TierResult::Failed("playback ended without reporting completion".to_string()),
                    Err(_) => {
                        // Overlong clips end the session; nothing plays after them
                        warn!("Session {}: {} still playing after {:?}, stopping it", ticket.id, tier, timeout);
                        handle.stop();
                        TierResult::Played
                    }
                }
            }
        };

        if matches!(result, TierResult::Failed(_)) {
            handle.stop();
        }
        self.slot.detach(ticket.id);
        result
    }
}

fn log_attempt(session: u64, key: &str, tier: Tier, result: &TierResult) {
    match result {
        TierResult::Played => info!(session, key, "Played via {}", tier),
        TierResult::Missing => debug!(session, key, "No {} available", tier),
        TierResult::Skipped(reason) => debug!(session, key, "Skipped {}: {}", tier, reason),
        TierResult::Failed(reason) => warn!(session, key, "{} failed, falling through: {}", tier, reason),
        TierResult::Cancelled => debug!(session, key, "{} cancelled", tier),
    }
}
