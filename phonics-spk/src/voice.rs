//! Voice selection for synthesized speech
//!
//! Platforms often report their voice list late (empty at startup, filled
//! in a moment later). [`VoiceDirectory`] keeps the latest list, re-runs
//! selection whenever it changes and reports whether the list has settled.

use crate::engines::SpeechEngine;
use crate::error::AudioError;
use parking_lot::RwLock;
use phonics_core::config::VoiceConfig;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};

/// A voice offered by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceCandidate {
    pub name: String,
    pub lang: String,
}

impl VoiceCandidate {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

/// Ordered preferences used by [`select_voice`]
#[derive(Debug, Clone, PartialEq)]
pub struct VoicePolicy {
    /// Regional language tag, e.g. "en-GB"
    pub language: String,
    pub preferred_female: String,
    pub preferred_male: String,
    /// Name fragment skipped by the regional pass
    pub excluded: String,
}

impl VoicePolicy {
    pub fn from_config(config: &VoiceConfig) -> Self {
        Self {
            language: config.language.clone(),
            preferred_female: config.preferred_female.clone(),
            preferred_male: config.preferred_male.clone(),
            excluded: config.excluded.clone(),
        }
    }

    /// Whether a voice's language tag belongs to the configured region.
    ///
    /// "en-GB", "en_GB" and "en-gb-x-rp" all match "en-GB".
    pub fn matches_region(&self, lang: &str) -> bool {
        let wanted = normalize_tag(&self.language);
        !wanted.is_empty() && normalize_tag(lang).starts_with(&wanted)
    }

    fn is_excluded(&self, name: &str) -> bool {
        !self.excluded.is_empty() && name.contains(&self.excluded)
    }
}

impl Default for VoicePolicy {
    fn default() -> Self {
        Self::from_config(&VoiceConfig::default())
    }
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().replace('_', "-").to_ascii_lowercase()
}

fn name_contains(candidate: &VoiceCandidate, fragment: &str) -> bool {
    !fragment.is_empty() && candidate.name.contains(fragment)
}

/// Pick the best voice from `available`.
///
/// First match wins, in order: the preferred female voice, the preferred
/// male voice, a regional voice whose name avoids the excluded fragment,
/// any regional voice. Returns `None` when nothing qualifies.
pub fn select_voice(available: &[VoiceCandidate], policy: &VoicePolicy) -> Option<VoiceCandidate> {
    available
        .iter()
        .find(|v| name_contains(v, &policy.preferred_female))
        .or_else(|| available.iter().find(|v| name_contains(v, &policy.preferred_male)))
        .or_else(|| {
            available
                .iter()
                .find(|v| policy.matches_region(&v.lang) && !policy.is_excluded(&v.name))
        })
        .or_else(|| available.iter().find(|v| policy.matches_region(&v.lang)))
        .cloned()
}

#[derive(Debug, Default)]
struct DirectoryState {
    candidates: Vec<VoiceCandidate>,
    settled: bool,
}

/// Latest platform voice list plus the voice currently selected from it
pub struct VoiceDirectory {
    policy: VoicePolicy,
    state: RwLock<DirectoryState>,
    selected: watch::Sender<Option<VoiceCandidate>>,
}

impl VoiceDirectory {
    pub fn new(policy: VoicePolicy) -> Self {
        let (selected, _) = watch::channel(None);
        Self {
            policy,
            state: RwLock::new(DirectoryState::default()),
            selected,
        }
    }

    pub fn policy(&self) -> &VoicePolicy {
        &self.policy
    }

    /// Replace the voice list and re-run selection.
    ///
    /// Returns true when the selected voice changed. A non-empty list marks
    /// the directory settled.
    pub fn update(&self, candidates: Vec<VoiceCandidate>) -> bool {
        let choice = select_voice(&candidates, &self.policy);
        {
            let mut state = self.state.write();
            if !candidates.is_empty() {
                state.settled = true;
            }
            debug!("Voice list updated: {} voices", candidates.len());
            state.candidates = candidates;
        }

        let changed = self.selected.send_if_modified(|current| {
            if *current != choice {
                *current = choice.clone();
                true
            } else {
                false
            }
        });

        if changed {
            match &choice {
                Some(voice) => info!("Selected voice {} ({})", voice.name, voice.lang),
                None => info!("No voice matches {}; using engine default", self.policy.language),
            }
        }
        changed
    }

    /// Pull the current list from a speech engine.
    pub async fn refresh(&self, engine: &dyn SpeechEngine) -> Result<bool, AudioError> {
        let voices = engine.list_voices().await?;
        Ok(self.update(voices))
    }

    pub fn selected(&self) -> Option<VoiceCandidate> {
        self.selected.borrow().clone()
    }

    pub fn candidates(&self) -> Vec<VoiceCandidate> {
        self.state.read().candidates.clone()
    }

    /// True once a non-empty voice list has been seen
    pub fn is_settled(&self) -> bool {
        self.state.read().settled
    }

    /// Watch the selected voice; fires on every change.
    pub fn subscribe(&self) -> watch::Receiver<Option<VoiceCandidate>> {
        self.selected.subscribe()
    }
}

impl Default for VoiceDirectory {
    fn default() -> Self {
        Self::new(VoicePolicy::default())
    }
}
