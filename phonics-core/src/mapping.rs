//! Grapheme to sound mapping
//!
//! Maps a written grapheme to the sound key its recording is filed under,
//! e.g. "ck" plays the "c" sound and "q" plays "qu".

use crate::grapheme::Grapheme;
use std::fmt;

/// (grapheme, sound) pairs, lowercase.
static SOUND_TABLE: &[(&str, &str)] = &[
    ("s", "s"),
    ("a", "a"),
    ("t", "t"),
    ("p", "p"),
    ("i", "i"),
    ("n", "n"),
    ("m", "m"),
    ("d", "d"),
    ("g", "g"),
    ("o", "o"),
    ("c", "c"),
    ("k", "c"),
    ("ck", "c"),
    ("e", "e"),
    ("u", "u"),
    ("r", "r"),
    ("h", "h"),
    ("b", "b"),
    ("f", "f"),
    ("ff", "f"),
    ("l", "l"),
    ("ll", "l"),
    ("ss", "s"),
    ("j", "j"),
    ("v", "v"),
    ("w", "w"),
    ("x", "x"),
    ("y", "y"),
    ("z", "z"),
    ("zz", "z"),
    // no standalone q recording exists
    ("q", "qu"),
    ("qu", "qu"),
    ("ch", "ch"),
    ("sh", "sh"),
    ("th", "th"),
    ("ng", "ng"),
    ("ai", "ai"),
    ("ee", "ee"),
    ("igh", "igh"),
    ("oa", "oa"),
    ("oo", "oo"),
    ("ooo", "ooo"),
    ("ar", "ar"),
    ("or", "or"),
    ("ur", "ur"),
    ("ow", "ow"),
    ("oi", "oi"),
    ("ear", "ear"),
    ("air", "air"),
    ("ure", "ure"),
    ("er", "er"),
];

/// Picture shown on the keyboard key for a grapheme.
static ICON_TABLE: &[(&str, &str)] = &[
    ("s", "sun"),
    ("a", "ant"),
    ("t", "tap"),
    ("p", "penguin"),
    ("i", "igloo"),
    ("n", "net"),
    ("m", "map"),
    ("d", "dog"),
    ("g", "guitar"),
    ("o", "octopus"),
    ("c", "cat"),
    ("k", "king"),
    ("ck", "duck"),
    ("e", "egg"),
    ("u", "umbrella"),
    ("r", "rat"),
    ("h", "hat"),
    ("b", "bin"),
    ("f", "frog"),
    ("ff", "muffin"),
    ("l", "leaf"),
    ("ll", "bell"),
    ("ss", "dress"),
];

/// Canonical uppercase sound identifier used for recordings and asset files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhonemeKey(String);

impl PhonemeKey {
    /// Build a key from arbitrary text, uppercasing it.
    pub fn new(key: &str) -> Self {
        Self(key.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhonemeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PhonemeKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Sound a lowercase grapheme maps to, if it is in the table.
pub fn mapped_sound(grapheme: &str) -> Option<&'static str> {
    SOUND_TABLE
        .iter()
        .find(|(g, _)| *g == grapheme)
        .map(|(_, sound)| *sound)
}

pub fn is_mapped(grapheme: &str) -> bool {
    mapped_sound(grapheme).is_some()
}

/// Resolve the sound key for a grapheme.
///
/// Unmapped single letters resolve to themselves.
pub fn resolve_phoneme_key(grapheme: &Grapheme) -> PhonemeKey {
    let lower = grapheme.lowercase();
    match mapped_sound(&lower) {
        Some(sound) => PhonemeKey::new(sound),
        None => PhonemeKey::new(grapheme.as_str()),
    }
}

/// Every grapheme in the table, lowercase, in teaching order.
pub fn known_graphemes() -> impl Iterator<Item = &'static str> {
    SOUND_TABLE.iter().map(|(g, _)| *g)
}

pub fn multi_letter_graphemes() -> impl Iterator<Item = &'static str> {
    known_graphemes().filter(|g| g.len() > 1)
}

pub fn icon_for(grapheme: &Grapheme) -> Option<&'static str> {
    let lower = grapheme.lowercase();
    ICON_TABLE
        .iter()
        .find(|(g, _)| *g == lower)
        .map(|(_, icon)| *icon)
}
