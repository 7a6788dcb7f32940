use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub model_path: PathBuf,
    pub lexicon_path: PathBuf,
    pub corpus_path: PathBuf,
    pub sentiment: SentimentSetting,
    /// Optional replacement for the built-in sentiment lexicon.
    pub sentiment_lexicon_path: Option<PathBuf>,
    pub port: u16,
    pub rust_log: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentSetting {
    Enabled,
    Disabled,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            model_path: env_path("BIASCHECK_MODEL_PATH", "model/bias_model.bin"),
            lexicon_path: env_path(
                "BIASCHECK_LEXICON_PATH",
                "data/corrected_gender_dataset.csv",
            ),
            corpus_path: env_path(
                "BIASCHECK_CORPUS_PATH",
                "data/biascheck_dataset_labeled_cleaned.csv",
            ),
            sentiment: parse_sentiment_setting(
                &std::env::var("BIASCHECK_SENTIMENT").unwrap_or_else(|_| "enabled".to_string()),
            )?,
            sentiment_lexicon_path: std::env::var("BIASCHECK_SENTIMENT_LEXICON")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

fn parse_sentiment_setting(raw: &str) -> Result<SentimentSetting> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "enabled" | "on" | "true" | "1" => Ok(SentimentSetting::Enabled),
        "disabled" | "off" | "false" | "0" => Ok(SentimentSetting::Disabled),
        other => bail!("BIASCHECK_SENTIMENT must be 'enabled' or 'disabled', got '{other}'"),
    }
}

/// How per-class sample weights are derived during classifier fitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassWeight {
    /// `n_samples / (n_classes * class_count)`, so minority labels are not starved.
    Balanced,
    Uniform,
}

/// Knobs for the offline training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Fraction of each label held out for evaluation.
    #[serde(default = "default_test_size")]
    pub test_size: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Vocabulary bound for the TF-IDF stage.
    #[serde(default = "default_max_features")]
    pub max_features: usize,
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    /// Inverse L2 regularisation strength.
    #[serde(default = "default_c")]
    pub c: f64,
    #[serde(default = "default_tol")]
    pub tol: f64,
    #[serde(default = "default_class_weight")]
    pub class_weight: ClassWeight,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: default_test_size(),
            seed: default_seed(),
            max_features: default_max_features(),
            max_iter: default_max_iter(),
            c: default_c(),
            tol: default_tol(),
            class_weight: default_class_weight(),
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<(), crate::errors::AppError> {
        use crate::errors::AppError;

        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(AppError::Configuration(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.max_features == 0 {
            return Err(AppError::Configuration(
                "max_features must be positive".to_string(),
            ));
        }
        if self.max_iter == 0 {
            return Err(AppError::Configuration("max_iter must be positive".to_string()));
        }
        if !self.c.is_finite() || self.c <= 0.0 {
            return Err(AppError::Configuration(format!(
                "C must be a finite positive number, got {}",
                self.c
            )));
        }
        if !self.tol.is_finite() || self.tol < 0.0 {
            return Err(AppError::Configuration(format!(
                "tol must be a finite non-negative number, got {}",
                self.tol
            )));
        }
        Ok(())
    }
}

fn default_test_size() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

fn default_max_features() -> usize {
    2000
}

fn default_max_iter() -> usize {
    2000
}

fn default_c() -> f64 {
    1.0
}

fn default_tol() -> f64 {
    1e-4
}

fn default_class_weight() -> ClassWeight {
    ClassWeight::Balanced
}
