//! Instrumented fakes shared by the orchestrator tests
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use phonics_core::{PhonemeKey, PhonicsConfig};
use phonics_spk::{
    AssetSource, AudioError, AudioOutput, CustomSpeechEngine, Playback, PlaybackHandle, PlaybackOrchestrator,
    Utterance, VoiceCandidate,
};
use phonics_storage::{MemoryRecordingStore, RecordingStore};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Clip content that fails to decode
pub const UNDECODABLE: &[u8] = b"undecodable";
/// Clip content that errors mid-playback
pub const BROKEN: &[u8] = b"broken";
/// Clip content that plays until stopped
pub const ENDLESS: &[u8] = b"endless";
/// Clip content that plays until stopped, then reports success like rodio
pub const COMPLETES_ON_STOP: &[u8] = b"completes-on-stop";

#[derive(Default)]
pub struct OutputStats {
    pub started: Mutex<Vec<Bytes>>,
    pub stops: AtomicUsize,
    pub live: AtomicUsize,
    pub max_live: AtomicUsize,
    pub warm_ups: AtomicUsize,
}

struct FakeHandle {
    stats: Arc<OutputStats>,
    ended: AtomicBool,
    completes_on_stop: bool,
    hold: Mutex<Option<oneshot::Sender<Result<(), AudioError>>>>,
}

impl FakeHandle {
    fn end(&self) -> bool {
        if !self.ended.swap(true, Ordering::SeqCst) {
            self.stats.live.fetch_sub(1, Ordering::SeqCst);
            true
        } else {
            false
        }
    }
}

impl PlaybackHandle for FakeHandle {
    fn stop(&self) {
        self.stats.stops.fetch_add(1, Ordering::SeqCst);
        self.end();
        if let Some(tx) = self.hold.lock().take() {
            if self.completes_on_stop {
                let _ = tx.send(Ok(()));
            }
        }
    }
}

/// Output device that plays nothing but tracks every clip
pub struct FakeOutput {
    pub stats: Arc<OutputStats>,
    clip_duration: Duration,
}

impl FakeOutput {
    pub fn new(clip_duration: Duration) -> Self {
        Self {
            stats: Arc::new(OutputStats::default()),
            clip_duration,
        }
    }

    pub fn started(&self) -> Vec<Bytes> {
        self.stats.started.lock().clone()
    }

    pub fn live(&self) -> usize {
        self.stats.live.load(Ordering::SeqCst)
    }

    pub fn max_live(&self) -> usize {
        self.stats.max_live.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioOutput for FakeOutput {
    async fn start(&self, clip: Bytes, _volume: f32) -> Result<Playback, AudioError> {
        if clip.as_ref() == UNDECODABLE {
            return Err(AudioError::Decode("not audio".to_string()));
        }

        self.stats.started.lock().push(clip.clone());
        let now = self.stats.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_live.fetch_max(now, Ordering::SeqCst);

        let (tx, rx) = oneshot::channel();
        let handle = Arc::new(FakeHandle {
            stats: self.stats.clone(),
            ended: AtomicBool::new(false),
            completes_on_stop: clip.as_ref() == COMPLETES_ON_STOP,
            hold: Mutex::new(None),
        });

        if clip.as_ref() == BROKEN {
            handle.end();
            let _ = tx.send(Err(AudioError::PlaybackDevice("device lost".to_string())));
        } else if clip.as_ref() == ENDLESS || clip.as_ref() == COMPLETES_ON_STOP {
            *handle.hold.lock() = Some(tx);
        } else {
            let finishing = handle.clone();
            let duration = self.clip_duration;
            tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                if finishing.end() {
                    let _ = tx.send(Ok(()));
                }
            });
        }

        Ok(Playback::new(handle, rx))
    }

    async fn warm_up(&self) -> Result<(), AudioError> {
        self.stats.warm_ups.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Bundled sound files held in memory
#[derive(Default)]
pub struct FakeAssets {
    files: HashMap<String, Bytes>,
    stalled: HashSet<String>,
    pub fetches: AtomicUsize,
}

impl FakeAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, key: &str, clip: &[u8]) -> Self {
        self.files.insert(key.to_string(), Bytes::copy_from_slice(clip));
        self
    }

    /// Fetches for `key` never complete
    pub fn with_stalled(mut self, key: &str) -> Self {
        self.stalled.insert(key.to_string());
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetSource for FakeAssets {
    async fn fetch(&self, key: &PhonemeKey) -> Result<Bytes, AudioError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.stalled.contains(key.as_str()) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        self.files
            .get(key.as_str())
            .cloned()
            .ok_or_else(|| AudioError::AssetNotFound(key.to_string()))
    }

    fn locate(&self, key: &PhonemeKey) -> String {
        format!("test://{}", key)
    }
}

/// Speech engine that records utterances and returns "speech:{text}"
pub struct SpeechStub {
    pub engine: Arc<CustomSpeechEngine>,
    pub utterances: Arc<Mutex<Vec<Utterance>>>,
    pub voice_queries: Arc<AtomicUsize>,
}

pub fn speech_stub(voices: Vec<VoiceCandidate>, available: bool) -> SpeechStub {
    let utterances = Arc::new(Mutex::new(Vec::new()));
    let voice_queries = Arc::new(AtomicUsize::new(0));

    let recorded = utterances.clone();
    let queries = voice_queries.clone();
    let engine = CustomSpeechEngine::new(
        "stub",
        move |utterance: &Utterance| {
            recorded.lock().push(utterance.clone());
            Ok(Bytes::from(format!("speech:{}", utterance.text)))
        },
        move || {
            queries.fetch_add(1, Ordering::SeqCst);
            Ok(voices.clone())
        },
        move || available,
    );

    SpeechStub {
        engine: Arc::new(engine),
        utterances,
        voice_queries,
    }
}

pub fn test_config() -> PhonicsConfig {
    let mut config = PhonicsConfig::default();
    config.playback.load_timeout_ms = 200;
    config.playback.playback_timeout_ms = 2_000;
    config
}

pub fn uk_voices() -> Vec<VoiceCandidate> {
    vec![
        VoiceCandidate::new("Daniel", "en-GB"),
        VoiceCandidate::new("Google UK English Female", "en-GB"),
    ]
}

pub struct Harness {
    pub orchestrator: Arc<PlaybackOrchestrator>,
    pub store: Arc<MemoryRecordingStore>,
    pub assets: Arc<FakeAssets>,
    pub output: Arc<FakeOutput>,
    pub speech: SpeechStub,
}

impl Harness {
    pub fn new(config: PhonicsConfig, assets: FakeAssets) -> Self {
        Self::with_speech(config, assets, speech_stub(uk_voices(), true))
    }

    pub fn with_speech(config: PhonicsConfig, assets: FakeAssets, speech: SpeechStub) -> Self {
        let store = Arc::new(MemoryRecordingStore::new());
        Self::with_store(config, assets, speech, store.clone(), store)
    }

    pub fn with_store(
        config: PhonicsConfig,
        assets: FakeAssets,
        speech: SpeechStub,
        recordings: Arc<dyn RecordingStore>,
        store: Arc<MemoryRecordingStore>,
    ) -> Self {
        Self::build(config, assets, speech, recordings, store, Duration::from_millis(20))
    }

    /// Ordinary clips take `clip_duration` to finish
    pub fn with_clip_duration(config: PhonicsConfig, assets: FakeAssets, clip_duration: Duration) -> Self {
        let store = Arc::new(MemoryRecordingStore::new());
        Self::build(
            config,
            assets,
            speech_stub(uk_voices(), true),
            store.clone(),
            store,
            clip_duration,
        )
    }

    fn build(
        config: PhonicsConfig,
        assets: FakeAssets,
        speech: SpeechStub,
        recordings: Arc<dyn RecordingStore>,
        store: Arc<MemoryRecordingStore>,
        clip_duration: Duration,
    ) -> Self {
        let assets = Arc::new(assets);
        let output = Arc::new(FakeOutput::new(clip_duration));
        let orchestrator = PlaybackOrchestrator::new(
            config,
            recordings,
            assets.clone(),
            output.clone(),
            speech.engine.clone(),
        )
        .expect("valid test config");

        Self {
            orchestrator: Arc::new(orchestrator),
            store,
            assets,
            output,
            speech,
        }
    }

    pub fn spoken(&self) -> Vec<String> {
        self.speech.utterances.lock().iter().map(|u| u.text.clone()).collect()
    }
}
