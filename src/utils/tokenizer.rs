//! Text normalization and the fixed marker tables.
//!
//! Tokenization never fails: anything outside the token alphabet becomes a
//! separator, whitespace collapses, and tokens shorter than two characters
//! are dropped. Positions are the indices of the surviving tokens.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

/// Shortest token kept by the tokenizer, in characters
pub const MIN_TOKEN_LEN: usize = 2;

lazy_static! {
    static ref NON_TOKEN: Regex = Regex::new(r"[^a-z0-9_'\s-]+").unwrap();
    static ref TEMPORAL_MARKERS: HashSet<&'static str> = [
        "then",
        "now",
        "before",
        "after",
        "when",
        "while",
        "during",
        "until",
        "since",
        "already",
        "soon",
        "later",
        "earlier",
        "yesterday",
        "today",
        "tomorrow",
        "always",
        "never",
        "once",
        "first",
        "last",
        "next",
        "finally",
        "eventually",
        "immediately",
        "suddenly",
        "gradually",
        "recently",
        "formerly",
        "meanwhile",
    ]
    .iter()
    .copied()
    .collect();
}

/// Symmetric antonym table; a token may appear in more than one entry.
const CONTRAST_PAIRS: [(&str, &str); 20] = [
    ("good", "bad"),
    ("big", "small"),
    ("hot", "cold"),
    ("fast", "slow"),
    ("old", "new"),
    ("high", "low"),
    ("light", "dark"),
    ("happy", "sad"),
    ("strong", "weak"),
    ("hard", "soft"),
    ("loud", "quiet"),
    ("clean", "dirty"),
    ("rich", "poor"),
    ("safe", "dangerous"),
    ("full", "empty"),
    ("long", "short"),
    ("thick", "thin"),
    ("wide", "narrow"),
    ("deep", "shallow"),
    ("young", "old"),
];

/// Normalize raw text into an ordered sequence of lowercase tokens.
///
/// Tokenizing the same string twice yields identical sequences.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let cleaned = NON_TOKEN.replace_all(&lowered, " ");
    cleaned
        .split_whitespace()
        .filter(|word| word.len() >= MIN_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}

pub fn is_temporal_marker(token: &str) -> bool {
    TEMPORAL_MARKERS.contains(token)
}

/// Whether any contrast partner of `token` appears in `tokens`
pub fn has_contrast_partner_in(token: &str, tokens: &HashSet<&str>) -> bool {
    CONTRAST_PAIRS.iter().any(|(a, b)| {
        (*a == token && tokens.contains(b)) || (*b == token && tokens.contains(a))
    })
}
