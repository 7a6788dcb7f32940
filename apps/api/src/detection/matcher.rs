use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::detection::normalize::normalize;
use crate::lexicon::BiasLexicon;

/// Structured bias report for one text. Ephemeral; never persisted by the core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub male_words: BTreeSet<String>,
    pub female_words: BTreeSet<String>,
    /// Every bias type of the lexicon, mapped to the words found for it (possibly empty).
    pub by_type: BTreeMap<String, BTreeSet<String>>,
    pub bias_detected: bool,
}

impl MatchResult {
    /// Total number of distinct matched words across all groupings.
    pub fn match_count(&self) -> usize {
        let mut all: BTreeSet<&str> = BTreeSet::new();
        all.extend(self.male_words.iter().map(String::as_str));
        all.extend(self.female_words.iter().map(String::as_str));
        for words in self.by_type.values() {
            all.extend(words.iter().map(String::as_str));
        }
        all.len()
    }
}

/// Returns the subset of `words` (in their original spelling) whose normalized
/// form occurs as a substring of the normalized text.
///
/// Substring, not whole-word: "rock" matches inside "rockstar". Words that
/// normalize to nothing are ignored, since the empty string matches everywhere.
pub fn find_matches<'a, I>(text: &str, words: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    find_in_normalized(&normalize(text), words)
}

fn find_in_normalized<'a, I>(normalized_text: &str, words: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    words
        .into_iter()
        .filter(|word| {
            let norm_word = normalize(word);
            !norm_word.is_empty() && normalized_text.contains(&norm_word)
        })
        .cloned()
        .collect()
}

/// Runs the matcher independently against the male set, the female set and
/// every bias-type set of the lexicon.
pub fn detect_bias(text: &str, lexicon: &BiasLexicon) -> MatchResult {
    let normalized = normalize(text);

    let male_words = find_in_normalized(&normalized, lexicon.male_words());
    let female_words = find_in_normalized(&normalized, lexicon.female_words());
    let by_type: BTreeMap<String, BTreeSet<String>> = lexicon
        .by_type()
        .iter()
        .map(|(bias_type, words)| (bias_type.clone(), find_in_normalized(&normalized, words)))
        .collect();

    let bias_detected = !male_words.is_empty()
        || !female_words.is_empty()
        || by_type.values().any(|words| !words.is_empty());

    MatchResult {
        male_words,
        female_words,
        by_type,
        bias_detected,
    }
}

/// Renders a plain-text report of a `MatchResult`.
pub fn render_report(result: &MatchResult) -> String {
    let mut lines = vec![
        "=== Bias Detection Report ===".to_string(),
        format!(
            "Bias detected: {}",
            if result.bias_detected { "YES" } else { "NO" }
        ),
        String::new(),
    ];

    if !result.male_words.is_empty() {
        lines.push(format!("Male-coded words/phrases: {}", join(&result.male_words)));
    }
    if !result.female_words.is_empty() {
        lines.push(format!(
            "Female-coded words/phrases: {}",
            join(&result.female_words)
        ));
    }
    for (bias_type, words) in &result.by_type {
        if !words.is_empty() {
            lines.push(format!(
                "{} bias words/phrases: {}",
                title_case(bias_type),
                join(words)
            ));
        }
    }
    if !result.bias_detected {
        lines.push("No bias-coded words or phrases found.".to_string());
    }

    lines.join("\n")
}

fn join(words: &BTreeSet<String>) -> String {
    words.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// "cultural_fit" → "Cultural Fit"
fn title_case(tag: &str) -> String {
    tag.replace('_', " ")
        .split(' ')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::tests::sample_lexicon;
    use pretty_assertions::assert_eq;

    fn set(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_find_matches_ignores_case_and_punctuation() {
        let words = set(&["team player"]);
        assert_eq!(
            find_matches("We need a Team-Player!", &words),
            set(&["team player"])
        );
    }

    #[test]
    fn test_find_matches_is_substring_not_whole_word() {
        let words = set(&["rock"]);
        assert_eq!(find_matches("rockstar developer", &words), set(&["rock"]));
    }

    #[test]
    fn test_find_matches_returns_original_spelling() {
        let words = set(&["Self-Starter"]);
        assert_eq!(
            find_matches("an independent self starter", &words),
            set(&["Self-Starter"])
        );
    }

    #[test]
    fn test_find_matches_skips_words_that_normalize_to_empty() {
        let words = set(&["--", "!!"]);
        assert!(find_matches("anything at all", &words).is_empty());
    }

    #[test]
    fn test_detect_bias_on_neutral_text() {
        let lexicon = sample_lexicon();
        let result = detect_bias(
            "Seeking qualified candidates with excellent communication skills.",
            &lexicon,
        );
        assert!(!result.bias_detected);
        assert!(result.male_words.is_empty());
        assert!(result.female_words.is_empty());
        assert!(result.by_type.values().all(BTreeSet::is_empty));
        assert_eq!(result.match_count(), 0);
    }

    #[test]
    fn test_detect_bias_competition_scenario() {
        let lexicon = sample_lexicon();
        let result = detect_bias(
            "Guys, we want an aggressive rockstar who can dominate the competition",
            &lexicon,
        );
        assert!(result.bias_detected);
        assert_eq!(result.by_type["competition"], set(&["aggressive", "dominate", "rockstar"]));
        assert_eq!(result.by_type["gender"], set(&["guys"]));
        assert!(result.male_words.contains("guys"));
        assert!(result.female_words.is_empty());
    }

    #[test]
    fn test_detect_bias_catches_phrases_across_line_breaks() {
        let lexicon = sample_lexicon();
        let result = detect_bias("Our team of digital\nnatives wants a culture-fit.", &lexicon);
        assert_eq!(result.by_type["age"], set(&["digital native"]));
        assert_eq!(result.by_type["cultural"], set(&["culture fit"]));
    }

    #[test]
    fn test_render_report_lists_groups() {
        let lexicon = sample_lexicon();
        let result = detect_bias("A supportive, young rockstar", &lexicon);
        let report = render_report(&result);
        assert!(report.contains("Bias detected: YES"));
        assert!(report.contains("Female-coded words/phrases: supportive"));
        assert!(report.contains("Competition bias words/phrases: rockstar"));
        assert!(report.contains("Age bias words/phrases: young"));
    }

    #[test]
    fn test_render_report_for_clean_text() {
        let report = render_report(&MatchResult::default());
        assert!(report.contains("Bias detected: NO"));
        assert!(report.ends_with("No bias-coded words or phrases found."));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("cultural_fit"), "Cultural Fit");
        assert_eq!(title_case("age"), "Age");
    }
}
