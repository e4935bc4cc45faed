//! phonics-core: graphemes, sound tables and configuration
//!
//! Pure, synchronous building blocks shared by the storage, speech and
//! capture crates.

pub mod error;
pub mod grapheme;
pub mod mapping;
pub mod phonemes;
pub mod config;

pub use error::{Error, Result};
pub use grapheme::{normalize, is_valid_letter, valid_letters, Grapheme, KeyboardCase};
pub use mapping::{icon_for, resolve_phoneme_key, PhonemeKey};
pub use phonemes::{phoneme_text, speech_text};
pub use config::PhonicsConfig;
