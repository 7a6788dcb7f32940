//! Lexicon-based polarity/subjectivity scorer.
//!
//! Each known word carries a polarity in [-1, 1] and a subjectivity in [0, 1].
//! A preceding intensifier scales the word's scores; a preceding negation flips
//! and halves its polarity. The text score is the mean over matched words.
//! Entries loaded from CSV may carry their own intensity multiplier.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::errors::AppError;
use crate::features::sentiment::{SentimentEngine, SentimentScore};

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]+(?:'[a-z]+)?").expect("word pattern is valid"));

const NEGATIONS: &[&str] = &["not", "no", "never", "without", "nor", "hardly"];

const NEGATION_FACTOR: f64 = -0.5;

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("really", 1.3),
    ("highly", 1.3),
    ("super", 1.3),
    ("so", 1.2),
    ("too", 1.2),
    ("extremely", 1.5),
    ("incredibly", 1.5),
    ("exceptionally", 1.5),
    ("truly", 1.2),
];

/// (word, polarity, subjectivity)
const BUILTIN_LEXICON: &[(&str, f64, f64)] = &[
    ("amazing", 0.6, 0.9),
    ("awesome", 1.0, 1.0),
    ("best", 1.0, 0.3),
    ("brilliant", 0.9, 1.0),
    ("caring", 0.5, 0.6),
    ("collaborative", 0.3, 0.4),
    ("comfortable", 0.4, 0.7),
    ("competitive", 0.0, 0.4),
    ("confident", 0.5, 0.8),
    ("creative", 0.5, 0.75),
    ("dedicated", 0.4, 0.5),
    ("diverse", 0.2, 0.5),
    ("dynamic", 0.1, 0.5),
    ("easy", 0.43, 0.83),
    ("elite", 0.3, 0.6),
    ("energetic", 0.2, 0.5),
    ("enjoyable", 0.4, 0.5),
    ("equal", 0.0, 0.25),
    ("excellent", 1.0, 1.0),
    ("exciting", 0.3, 0.8),
    ("fair", 0.7, 0.9),
    ("fantastic", 0.4, 0.9),
    ("fearless", 0.2, 0.6),
    ("flexible", 0.2, 0.4),
    ("friendly", 0.375, 0.5),
    ("fun", 0.3, 0.2),
    ("generous", 0.5, 0.6),
    ("good", 0.7, 0.6),
    ("great", 0.8, 0.75),
    ("happy", 0.8, 1.0),
    ("helpful", 0.5, 0.5),
    ("honest", 0.6, 0.9),
    ("ideal", 0.9, 0.9),
    ("inclusive", 0.3, 0.4),
    ("innovative", 0.5, 0.5),
    ("interesting", 0.5, 0.5),
    ("kind", 0.6, 0.9),
    ("modern", 0.2, 0.3),
    ("nice", 0.6, 1.0),
    ("outstanding", 0.5, 0.7),
    ("passionate", 0.3, 0.7),
    ("perfect", 1.0, 1.0),
    ("positive", 0.23, 0.55),
    ("proud", 0.8, 1.0),
    ("qualified", 0.1, 0.3),
    ("respectful", 0.4, 0.5),
    ("rewarding", 0.5, 0.6),
    ("right", 0.29, 0.54),
    ("safe", 0.5, 0.5),
    ("strong", 0.43, 0.73),
    ("successful", 0.75, 0.95),
    ("superior", 0.7, 0.9),
    ("supportive", 0.4, 0.5),
    ("talented", 0.7, 0.8),
    ("welcoming", 0.5, 0.6),
    ("welcome", 0.8, 0.9),
    ("wonderful", 1.0, 1.0),
    // negative
    ("aggressive", -0.2, 0.6),
    ("angry", -0.5, 1.0),
    ("annoying", -0.8, 0.9),
    ("awful", -1.0, 1.0),
    ("bad", -0.7, 0.67),
    ("boring", -1.0, 1.0),
    ("brutal", -0.875, 1.0),
    ("cold", -0.6, 1.0),
    ("demanding", -0.2, 0.5),
    ("difficult", -0.5, 1.0),
    ("disappointing", -0.6, 0.7),
    ("exhausting", -0.5, 0.8),
    ("fierce", -0.4, 0.7),
    ("hard", -0.29, 0.54),
    ("harsh", -0.6, 0.8),
    ("hate", -0.8, 0.9),
    ("hostile", -0.5, 0.6),
    ("killer", -0.3, 0.6),
    ("lazy", -0.25, 1.0),
    ("merciless", -0.6, 0.8),
    ("nasty", -1.0, 1.0),
    ("negative", -0.3, 0.4),
    ("poor", -0.4, 0.6),
    ("relentless", -0.2, 0.6),
    ("rude", -0.3, 0.6),
    ("ruthless", -0.6, 0.8),
    ("sad", -0.5, 1.0),
    ("stressful", -0.5, 0.7),
    ("stupid", -0.8, 1.0),
    ("terrible", -1.0, 1.0),
    ("toxic", -0.7, 0.8),
    ("ugly", -0.7, 1.0),
    ("unfair", -0.5, 0.9),
    ("unpleasant", -0.6, 0.8),
    ("weak", -0.375, 0.625),
    ("worst", -1.0, 1.0),
    ("wrong", -0.5, 0.9),
];

#[derive(Debug, Clone, Copy)]
struct WordSentiment {
    polarity: f64,
    subjectivity: f64,
    /// Per-word multiplier applied before context modifiers.
    intensity: f64,
}

#[derive(Debug, Deserialize)]
struct SentimentRow {
    word: String,
    polarity: f64,
    subjectivity: f64,
    #[serde(default)]
    intensity: Option<f64>,
}

/// Scores text against a word-level sentiment lexicon.
#[derive(Debug, Clone)]
pub struct LexiconSentimentEngine {
    words: HashMap<String, WordSentiment>,
}

impl LexiconSentimentEngine {
    pub fn builtin() -> Self {
        let words = BUILTIN_LEXICON
            .iter()
            .map(|&(word, polarity, subjectivity)| {
                (
                    word.to_string(),
                    WordSentiment {
                        polarity,
                        subjectivity,
                        intensity: 1.0,
                    },
                )
            })
            .collect();
        Self { words }
    }

    /// Loads a `word,polarity,subjectivity[,intensity]` CSV. Polarity and
    /// subjectivity are clamped to their ranges; a missing intensity is 1.0.
    /// Non-finite scores or a negative intensity reject the file.
    pub fn load_csv(path: &Path) -> Result<Self, AppError> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| {
            AppError::DataLoad(format!("cannot open sentiment lexicon {}: {e}", path.display()))
        })?;

        let mut words = HashMap::new();
        for (row_no, result) in reader.deserialize::<SentimentRow>().enumerate() {
            let row = result
                .map_err(|e| AppError::DataLoad(format!("sentiment lexicon row {row_no}: {e}")))?;
            if !row.polarity.is_finite() || !row.subjectivity.is_finite() {
                return Err(AppError::DataLoad(format!(
                    "sentiment lexicon row {row_no}: polarity and subjectivity must be finite"
                )));
            }
            let intensity = row.intensity.unwrap_or(1.0);
            if !intensity.is_finite() || intensity < 0.0 {
                return Err(AppError::DataLoad(format!(
                    "sentiment lexicon row {row_no}: intensity must be a finite non-negative number"
                )));
            }
            words.insert(
                row.word.trim().to_lowercase(),
                WordSentiment {
                    polarity: row.polarity.clamp(-1.0, 1.0),
                    subjectivity: row.subjectivity.clamp(0.0, 1.0),
                    intensity,
                },
            );
        }

        if words.is_empty() {
            return Err(AppError::DataLoad("sentiment lexicon is empty".to_string()));
        }
        Ok(Self { words })
    }

    fn intensity(token: &str) -> Option<f64> {
        INTENSIFIERS
            .iter()
            .find(|(word, _)| *word == token)
            .map(|(_, factor)| *factor)
    }

    fn is_negation(token: &str) -> bool {
        NEGATIONS.contains(&token) || token.ends_with("n't")
    }
}

impl SentimentEngine for LexiconSentimentEngine {
    fn name(&self) -> &str {
        "lexicon"
    }

    fn score(&self, text: &str) -> SentimentScore {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = WORD.find_iter(&lower).map(|m| m.as_str()).collect();

        let mut polarity_sum = 0.0;
        let mut subjectivity_sum = 0.0;
        let mut matched = 0usize;

        for (i, token) in tokens.iter().enumerate() {
            let Some(sentiment) = self.words.get(*token) else {
                continue;
            };

            let mut polarity = sentiment.polarity * sentiment.intensity;
            let mut subjectivity = sentiment.subjectivity * sentiment.intensity;

            // Look back at most two tokens: "not very good".
            let prev = i.checked_sub(1).map(|j| tokens[j]);
            let prev2 = i.checked_sub(2).map(|j| tokens[j]);

            if let Some(factor) = prev.and_then(Self::intensity) {
                polarity *= factor;
                subjectivity *= factor;
            }
            if prev.is_some_and(Self::is_negation) || prev2.is_some_and(Self::is_negation) {
                polarity *= NEGATION_FACTOR;
            }

            polarity_sum += polarity.clamp(-1.0, 1.0);
            subjectivity_sum += subjectivity.clamp(0.0, 1.0);
            matched += 1;
        }

        if matched == 0 {
            return SentimentScore::default();
        }

        SentimentScore {
            polarity: (polarity_sum / matched as f64).clamp(-1.0, 1.0),
            subjectivity: (subjectivity_sum / matched as f64).clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_no_known_words_scores_zero() {
        let engine = LexiconSentimentEngine::builtin();
        assert_eq!(engine.score("Seeking candidates for a role"), SentimentScore::default());
        assert_eq!(engine.score(""), SentimentScore::default());
    }

    #[test]
    fn test_positive_and_negative_polarity() {
        let engine = LexiconSentimentEngine::builtin();
        assert!(engine.score("A great and friendly team").polarity > 0.0);
        assert!(engine.score("A toxic, brutal culture").polarity < 0.0);
    }

    #[test]
    fn test_negation_flips_polarity() {
        let engine = LexiconSentimentEngine::builtin();
        let plain = engine.score("good").polarity;
        let negated = engine.score("not good").polarity;
        assert!(negated < 0.0);
        assert!((negated - plain * NEGATION_FACTOR).abs() < 1e-9);
        assert!(engine.score("isn't very good").polarity < 0.0);
    }

    #[test]
    fn test_intensifier_strengthens_and_clamps() {
        let engine = LexiconSentimentEngine::builtin();
        let plain = engine.score("good").polarity;
        let intense = engine.score("very good").polarity;
        assert!(intense > plain);
        let capped = engine.score("extremely excellent");
        assert_eq!(capped.polarity, 1.0);
        assert_eq!(capped.subjectivity, 1.0);
    }

    #[test]
    fn test_load_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "word,polarity,subjectivity").unwrap();
        writeln!(file, "Stellar,2.0,0.8").unwrap();
        let engine = LexiconSentimentEngine::load_csv(file.path()).unwrap();
        let score = engine.score("a stellar hire");
        assert_eq!(score.polarity, 1.0);
        assert!((score.subjectivity - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_load_csv_applies_intensity() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "word,polarity,subjectivity,intensity").unwrap();
        writeln!(file, "keen,0.4,0.5,2.0").unwrap();
        writeln!(file, "fine,0.4,0.5,").unwrap();
        let engine = LexiconSentimentEngine::load_csv(file.path()).unwrap();

        let keen = engine.score("keen");
        assert!((keen.polarity - 0.8).abs() < 1e-9);
        assert!((keen.subjectivity - 1.0).abs() < 1e-9);

        let fine = engine.score("fine");
        assert!((fine.polarity - 0.4).abs() < 1e-9);
        assert!((fine.subjectivity - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_load_csv_rejects_non_finite_scores() {
        for row in ["stellar,NaN,0.5", "stellar,0.5,inf", "stellar,0.5,0.5,NaN", "stellar,0.5,0.5,-1"] {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "word,polarity,subjectivity,intensity").unwrap();
            writeln!(file, "{row}").unwrap();
            let err = LexiconSentimentEngine::load_csv(file.path()).unwrap_err();
            assert!(matches!(err, AppError::DataLoad(_)), "row {row}: {err:?}");
        }
    }
}
