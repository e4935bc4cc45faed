//! Grapheme normalization
//!
//! A grapheme is either one of the 26 letters or one of the multi-letter
//! graphemes listed in [`crate::mapping`]. Lookups are case-insensitive;
//! the canonical form is uppercase.

use crate::error::Error;
use crate::mapping;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Canonical (uppercase) grapheme, guaranteed to be in the known set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Grapheme(String);

impl Grapheme {
    /// Parse user input into a grapheme, rejecting anything outside the known set.
    pub fn parse(input: &str) -> Result<Self, Error> {
        normalize(input).ok_or_else(|| Error::InvalidGrapheme(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn lowercase(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    pub fn is_single_letter(&self) -> bool {
        self.0.len() == 1
    }

    /// First letter of a single-letter grapheme.
    pub fn letter(&self) -> Option<char> {
        if self.is_single_letter() {
            self.0.chars().next()
        } else {
            None
        }
    }
}

impl fmt::Display for Grapheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Grapheme {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Grapheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Canonicalize a tapped letter or digraph.
///
/// Returns `None` for empty input, digits, punctuation and unknown
/// multi-letter sequences.
pub fn normalize(input: &str) -> Option<Grapheme> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.is_ascii() {
        return None;
    }

    if is_valid_letter(trimmed) {
        return Some(Grapheme(trimmed.to_ascii_uppercase()));
    }

    let lower = trimmed.to_ascii_lowercase();
    if mapping::is_mapped(&lower) {
        Some(Grapheme(lower.to_ascii_uppercase()))
    } else {
        None
    }
}

/// True when `input` is exactly one ASCII letter, in either case.
pub fn is_valid_letter(input: &str) -> bool {
    let mut chars = input.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_alphabetic())
}

/// Uppercase letters A-Z in keyboard order.
pub fn valid_letters() -> impl Iterator<Item = char> {
    LETTERS.chars()
}

/// Case the on-screen keyboard renders letters in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyboardCase {
    #[default]
    #[serde(alias = "uppercase")]
    Upper,
    #[serde(alias = "lowercase")]
    Lower,
}

impl KeyboardCase {
    pub fn toggle(self) -> Self {
        match self {
            KeyboardCase::Upper => KeyboardCase::Lower,
            KeyboardCase::Lower => KeyboardCase::Upper,
        }
    }

    /// Render a grapheme for display. Sound lookup is unaffected.
    pub fn display(self, grapheme: &Grapheme) -> String {
        match self {
            KeyboardCase::Upper => grapheme.as_str().to_string(),
            KeyboardCase::Lower => grapheme.lowercase(),
        }
    }
}
