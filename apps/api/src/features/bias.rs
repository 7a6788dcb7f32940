//! Bias word features: counts of lexicon words present as whole tokens.
//!
//! Per text: `[male_count, female_count, (count, presence) per bias type]`, bias
//! types in sorted order. Tokens come from a lowercase whitespace split, so
//! multi-word phrases and words glued to punctuation ("guys,") never match here.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::features::{FeatureMatrix, FeatureTransform};
use crate::lexicon::BiasLexicon;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasFeatureExtractor {
    male_words: BTreeSet<String>,
    female_words: BTreeSet<String>,
    /// Sorted; fixes the column order of the per-type features.
    bias_types: Vec<String>,
    /// Parallel to `bias_types`.
    type_words: Vec<BTreeSet<String>>,
}

impl BiasFeatureExtractor {
    /// Snapshots the lexicon. Words are lowercased to line up with the lowercased tokens.
    pub fn new(lexicon: &BiasLexicon) -> Self {
        let lower = |words: &BTreeSet<String>| -> BTreeSet<String> {
            words.iter().map(|w| w.to_lowercase()).collect()
        };

        let (bias_types, type_words): (Vec<String>, Vec<BTreeSet<String>>) = lexicon
            .by_type()
            .iter()
            .map(|(bias_type, words)| (bias_type.clone(), lower(words)))
            .unzip();

        Self {
            male_words: lower(lexicon.male_words()),
            female_words: lower(lexicon.female_words()),
            bias_types,
            type_words,
        }
    }

    pub fn bias_types(&self) -> &[String] {
        &self.bias_types
    }

    pub fn output_width(&self) -> usize {
        2 + 2 * self.bias_types.len()
    }

    fn row(&self, text: &str) -> Vec<f64> {
        let text_lower = text.to_lowercase();
        let tokens: HashSet<&str> = text_lower.split_whitespace().collect();
        let count_in = |words: &BTreeSet<String>| -> usize {
            words.iter().filter(|w| tokens.contains(w.as_str())).count()
        };

        let mut row = Vec::with_capacity(self.output_width());
        row.push(count_in(&self.male_words) as f64);
        row.push(count_in(&self.female_words) as f64);
        for words in &self.type_words {
            let count = count_in(words);
            row.push(count as f64);
            row.push(if count > 0 { 1.0 } else { 0.0 });
        }
        row
    }
}

impl FeatureTransform for BiasFeatureExtractor {
    fn name(&self) -> &'static str {
        "bias_words"
    }

    /// Configured at construction; nothing to learn.
    fn fit(&mut self, _texts: &[String]) -> Result<(), AppError> {
        Ok(())
    }

    fn transform(&self, texts: &[String]) -> Result<FeatureMatrix, AppError> {
        Ok(texts.iter().map(|t| self.row(t)).collect())
    }

    fn width(&self) -> Option<usize> {
        Some(self.output_width())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::tests::{entry, sample_lexicon};
    use crate::lexicon::GenderLabel;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_shape_is_two_plus_two_per_type() {
        let extractor = BiasFeatureExtractor::new(&sample_lexicon());
        let matrix = extractor
            .transform(&texts(&["one", "two words", ""]))
            .unwrap();
        assert_eq!(matrix.len(), 3);
        for row in &matrix {
            assert_eq!(row.len(), 2 + 2 * 5);
        }
    }

    #[test]
    fn test_whole_token_matching_is_stricter_than_substring() {
        let lexicon = BiasLexicon::from_entries(vec![entry("rock", GenderLabel::Male, "competition")]);
        let extractor = BiasFeatureExtractor::new(&lexicon);
        let row = &extractor.transform(&texts(&["rockstar"])).unwrap()[0];
        // [male, female, competition count, competition flag]
        assert_eq!(row, &vec![0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_counts_and_flags_per_type() {
        let extractor = BiasFeatureExtractor::new(&sample_lexicon());
        let row = &extractor
            .transform(&texts(&["Aggressive rockstar to dominate and be SUPPORTIVE"]))
            .unwrap()[0];
        // types: age, communal, competition, cultural, gender
        assert_eq!(row[0], 3.0, "male count");
        assert_eq!(row[1], 1.0, "female count");
        assert_eq!(&row[2..4], &[0.0, 0.0], "age");
        assert_eq!(&row[4..6], &[1.0, 1.0], "communal");
        assert_eq!(&row[6..8], &[3.0, 1.0], "competition");
        assert_eq!(&row[8..10], &[0.0, 0.0], "cultural");
        assert_eq!(&row[10..12], &[0.0, 0.0], "gender");
    }

    #[test]
    fn test_phrases_and_punctuated_tokens_are_not_detected() {
        let extractor = BiasFeatureExtractor::new(&sample_lexicon());
        let row = &extractor
            .transform(&texts(&["Guys, a culture fit digital native"]))
            .unwrap()[0];
        assert!(row.iter().all(|v| *v == 0.0), "got {row:?}");
    }

    #[test]
    fn test_fit_is_a_no_op() {
        let mut extractor = BiasFeatureExtractor::new(&sample_lexicon());
        let before = extractor.clone();
        extractor.fit(&texts(&["aggressive"])).unwrap();
        assert_eq!(extractor, before);
    }
}
