//! Custom speech engine
//! Wraps caller-supplied closures so any synthesizer can back the speech tier

use crate::engines::{SpeechEngine, Utterance, MAX_TEXT_LEN};
use crate::error::AudioError;
use crate::voice::VoiceCandidate;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::future::{self, BoxFuture, FutureExt};
use std::sync::Arc;

type SynthesizeFn = dyn Fn(Utterance) -> BoxFuture<'static, Result<Bytes, AudioError>> + Send + Sync;
type ListVoicesFn = dyn Fn() -> BoxFuture<'static, Result<Vec<VoiceCandidate>, AudioError>> + Send + Sync;

pub struct CustomSpeechEngine {
    name: String,
    synthesize_fn: Arc<SynthesizeFn>,
    list_voices_fn: Arc<ListVoicesFn>,
    is_available_fn: Arc<dyn Fn() -> bool + Send + Sync>,
}

impl CustomSpeechEngine {
    /// Build an engine from synchronous closures
    pub fn new<F1, F2, F3>(name: impl Into<String>, synthesize_fn: F1, list_voices_fn: F2, is_available_fn: F3) -> Self
    where
        F1: Fn(&Utterance) -> Result<Bytes, AudioError> + Send + Sync + 'static,
        F2: Fn() -> Result<Vec<VoiceCandidate>, AudioError> + Send + Sync + 'static,
        F3: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            synthesize_fn: Arc::new(move |utterance: Utterance| future::ready(synthesize_fn(&utterance)).boxed()),
            list_voices_fn: Arc::new(move || future::ready(list_voices_fn()).boxed()),
            is_available_fn: Arc::new(is_available_fn),
        }
    }

    /// Build an engine from closures returning futures.
    ///
    /// The futures are awaited in place, so slow synthesizers can be
    /// cancelled by dropping the call.
    pub fn from_async<F1, F2, F3>(name: impl Into<String>, synthesize_fn: F1, list_voices_fn: F2, is_available_fn: F3) -> Self
    where
        F1: Fn(Utterance) -> BoxFuture<'static, Result<Bytes, AudioError>> + Send + Sync + 'static,
        F2: Fn() -> BoxFuture<'static, Result<Vec<VoiceCandidate>, AudioError>> + Send + Sync + 'static,
        F3: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            synthesize_fn: Arc::new(synthesize_fn),
            list_voices_fn: Arc::new(list_voices_fn),
            is_available_fn: Arc::new(is_available_fn),
        }
    }
}

#[async_trait]
impl SpeechEngine for CustomSpeechEngine {
    async fn synthesize(&self, utterance: &Utterance) -> Result<Bytes, AudioError> {
        if utterance.text.trim().is_empty() {
            return Err(AudioError::SynthesisUnavailable("Text cannot be empty".to_string()));
        }
        if utterance.text.len() > MAX_TEXT_LEN {
            return Err(AudioError::SynthesisUnavailable(format!("Text too long (max {} bytes)", MAX_TEXT_LEN)));
        }

        (self.synthesize_fn)(utterance.clone()).await
    }

    async fn list_voices(&self) -> Result<Vec<VoiceCandidate>, AudioError> {
        (self.list_voices_fn)().await
    }

    fn is_available(&self) -> bool {
        (self.is_available_fn)()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
