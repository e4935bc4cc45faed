//! Phonetic spellings for speech synthesis
//!
//! Speech engines read "b" as "bee". These spellings make them produce
//! the letter sound instead (UK synthetic phonics: short vowels, pure
//! consonants).

use crate::grapheme::Grapheme;

static PHONEME_TEXT: [(char, &str); 26] = [
    ('A', "ah"),   // apple
    ('B', "buh"),  // bat
    ('C', "kuh"),  // cat
    ('D', "duh"),  // dog
    ('E', "eh"),   // egg
    ('F', "fff"),  // fan
    ('G', "guh"),  // got
    ('H', "huh"),  // hat
    ('I', "ih"),   // ink
    ('J', "juh"),  // jug
    ('K', "kuh"),  // king
    ('L', "lll"),  // leg
    ('M', "mmm"),  // mat
    ('N', "nnn"),  // net
    ('O', "oh"),   // orange
    ('P', "puh"),  // pig
    ('Q', "kwuh"), // queen
    ('R', "rrr"),  // rat
    ('S', "sss"),  // sun
    ('T', "tuh"),  // tap
    ('U', "uh"),   // umbrella
    ('V', "vvv"),  // van
    ('W', "wuh"),  // wet
    ('X', "ks"),   // box
    ('Y', "yuh"),  // yes
    ('Z', "zzz"),  // zip
];

/// Phonetic spelling for a letter, case-insensitive.
pub fn phoneme_text(letter: char) -> Option<&'static str> {
    let upper = letter.to_ascii_uppercase();
    PHONEME_TEXT
        .iter()
        .find(|(l, _)| *l == upper)
        .map(|(_, text)| *text)
}

/// Text to hand to a speech engine for a grapheme.
///
/// Multi-letter graphemes have no tuned spelling and are spoken as written.
pub fn speech_text(grapheme: &Grapheme) -> String {
    grapheme
        .letter()
        .and_then(phoneme_text)
        .map(str::to_string)
        .unwrap_or_else(|| grapheme.lowercase())
}

pub fn all_phonemes() -> impl Iterator<Item = (char, &'static str)> {
    PHONEME_TEXT.iter().copied()
}
