use once_cell::sync::Lazy;
use regex::Regex;

/// Punctuation and symbol characters. Each run becomes a single space so that
/// hyphenated forms ("team-player") line up with spaced lexicon phrases.
static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{P}\p{S}]+").expect("punctuation pattern is valid"));

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Canonicalizes text for lexical matching: lowercase, punctuation stripped,
/// whitespace runs (including newlines and tabs) collapsed to one space, trimmed.
///
/// Total and idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    let lower = text.to_lowercase();
    let without_punct = PUNCTUATION.replace_all(&lower, " ");
    let collapsed = WHITESPACE.replace_all(&without_punct, " ");
    collapsed.trim().to_string()
}
