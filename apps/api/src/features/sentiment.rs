//! Sentiment features: `[polarity, subjectivity]` per text.
//!
//! Whether a sentiment engine exists is resolved once into a `SentimentCapability`
//! and passed in. When it is unavailable the extractor still honours its contract
//! and emits zeros; the degradation is logged when the capability is resolved,
//! never per call.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{Config, SentimentSetting};
use crate::errors::AppError;
use crate::features::polarity::LexiconSentimentEngine;
use crate::features::{FeatureMatrix, FeatureTransform};

pub const SENTIMENT_WIDTH: usize = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    /// In [-1, 1].
    pub polarity: f64,
    /// In [0, 1].
    pub subjectivity: f64,
}

/// A general-purpose sentiment scorer.
pub trait SentimentEngine: Send + Sync {
    fn name(&self) -> &str;
    fn score(&self, text: &str) -> SentimentScore;
}

/// Resolved once at startup and shared by the extractor and the analyzer.
#[derive(Clone)]
pub enum SentimentCapability {
    Available(Arc<dyn SentimentEngine>),
    Unavailable { reason: String },
}

impl SentimentCapability {
    /// Resolves the capability from configuration, logging a degradation once.
    pub fn resolve(config: &Config) -> Self {
        if config.sentiment == SentimentSetting::Disabled {
            return Self::degraded("disabled by BIASCHECK_SENTIMENT");
        }

        match &config.sentiment_lexicon_path {
            None => Self::builtin(),
            Some(path) => match LexiconSentimentEngine::load_csv(path) {
                Ok(engine) => {
                    info!(path = %path.display(), "Sentiment lexicon loaded");
                    Self::Available(Arc::new(engine))
                }
                Err(e) => Self::degraded(&format!("sentiment lexicon unusable: {e}")),
            },
        }
    }

    pub fn builtin() -> Self {
        Self::Available(Arc::new(LexiconSentimentEngine::builtin()))
    }

    /// An unavailable capability; emits the degradation warning.
    pub fn degraded(reason: &str) -> Self {
        warn!("Sentiment engine unavailable ({reason}): sentiment features will be zeros");
        Self::Unavailable {
            reason: reason.to_string(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Scores one text, or zeros when no engine is present.
    pub fn score(&self, text: &str) -> SentimentScore {
        match self {
            Self::Available(engine) => engine.score(text),
            Self::Unavailable { .. } => SentimentScore::default(),
        }
    }
}

impl Default for SentimentCapability {
    fn default() -> Self {
        Self::Unavailable {
            reason: "no sentiment engine bound".to_string(),
        }
    }
}

impl fmt::Debug for SentimentCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available(engine) => f.debug_tuple("Available").field(&engine.name()).finish(),
            Self::Unavailable { reason } => f
                .debug_struct("Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}

/// The capability is runtime state and is not part of a serialized model;
/// `TrainedModel::load` rebinds it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentimentFeatureExtractor {
    #[serde(skip)]
    capability: SentimentCapability,
}

impl SentimentFeatureExtractor {
    pub fn new(capability: SentimentCapability) -> Self {
        Self { capability }
    }

    pub fn bind(&mut self, capability: SentimentCapability) {
        self.capability = capability;
    }

    pub fn is_available(&self) -> bool {
        self.capability.is_available()
    }
}

impl FeatureTransform for SentimentFeatureExtractor {
    fn name(&self) -> &'static str {
        "sentiment"
    }

    fn fit(&mut self, _texts: &[String]) -> Result<(), AppError> {
        Ok(())
    }

    fn transform(&self, texts: &[String]) -> Result<FeatureMatrix, AppError> {
        Ok(texts
            .iter()
            .map(|text| {
                let score = self.capability.score(text);
                vec![score.polarity, score.subjectivity]
            })
            .collect())
    }

    fn width(&self) -> Option<usize> {
        Some(SENTIMENT_WIDTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_engine_returns_zero_matrix() {
        let extractor = SentimentFeatureExtractor::new(SentimentCapability::degraded("test"));
        let matrix = extractor
            .transform(&["any text".to_string(), "more text".to_string()])
            .unwrap();
        assert_eq!(matrix, vec![vec![0.0, 0.0], vec![0.0, 0.0]]);
    }

    #[test]
    fn test_available_engine_scores_in_range() {
        let extractor = SentimentFeatureExtractor::new(SentimentCapability::builtin());
        let matrix = extractor
            .transform(&[
                "A wonderful, supportive and friendly team".to_string(),
                "A terrible, toxic environment".to_string(),
            ])
            .unwrap();
        assert!(matrix[0][0] > 0.0);
        assert!(matrix[1][0] < 0.0);
        for row in &matrix {
            assert!((-1.0..=1.0).contains(&row[0]));
            assert!((0.0..=1.0).contains(&row[1]));
        }
    }

    #[test]
    fn test_deserialized_extractor_is_unbound_until_rebound() {
        let extractor = SentimentFeatureExtractor::new(SentimentCapability::builtin());
        let bytes = bincode::serialize(&extractor).unwrap();
        let mut restored: SentimentFeatureExtractor = bincode::deserialize(&bytes).unwrap();
        assert!(!restored.is_available());
        restored.bind(SentimentCapability::builtin());
        assert!(restored.is_available());
    }

    #[test]
    fn test_disabled_setting_resolves_unavailable() {
        let config = Config {
            model_path: "model.bin".into(),
            lexicon_path: "lexicon.csv".into(),
            corpus_path: "corpus.csv".into(),
            sentiment: SentimentSetting::Disabled,
            sentiment_lexicon_path: None,
            port: 8000,
            rust_log: "info".to_string(),
        };
        assert!(!SentimentCapability::resolve(&config).is_available());
    }

    #[test]
    fn test_unreadable_sentiment_lexicon_degrades() {
        let config = Config {
            model_path: "model.bin".into(),
            lexicon_path: "lexicon.csv".into(),
            corpus_path: "corpus.csv".into(),
            sentiment: SentimentSetting::Enabled,
            sentiment_lexicon_path: Some("/nonexistent/sentiment.csv".into()),
            port: 8000,
            rust_log: "info".to_string(),
        };
        let capability = SentimentCapability::resolve(&config);
        assert!(matches!(capability, SentimentCapability::Unavailable { .. }));
    }

    #[test]
    fn test_non_finite_sentiment_lexicon_degrades() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "word,polarity,subjectivity").unwrap();
        writeln!(file, "stellar,NaN,0.5").unwrap();
        let config = Config {
            model_path: "model.bin".into(),
            lexicon_path: "lexicon.csv".into(),
            corpus_path: "corpus.csv".into(),
            sentiment: SentimentSetting::Enabled,
            sentiment_lexicon_path: Some(file.path().to_path_buf()),
            port: 8000,
            rust_log: "info".to_string(),
        };
        let capability = SentimentCapability::resolve(&config);
        assert!(matches!(capability, SentimentCapability::Unavailable { .. }));
        assert_eq!(capability.score("a stellar hire"), SentimentScore::default());
    }
}
