//! Inference entry points used by the HTTP layer.

pub mod handlers;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::detection::{detect_bias, MatchResult};
use crate::errors::AppError;
use crate::features::{SentimentCapability, SentimentScore};
use crate::lexicon::{BiasLexicon, GenderLabel};
use crate::model::ModelHandle;

/// A lexicon row found in an analyzed text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BiasWord {
    pub word: String,
    pub label: GenderLabel,
    pub bias_type: String,
    pub context_notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub label: String,
    pub probabilities: BTreeMap<String, f64>,
    pub bias_words: Vec<BiasWord>,
    pub sentiment: SentimentScore,
    pub summary: String,
}

/// Read-only view over the lexicon, the current model and the sentiment engine.
/// Cheap to clone; every request sees one consistent model snapshot.
#[derive(Debug, Clone)]
pub struct Analyzer {
    lexicon: Arc<BiasLexicon>,
    model: Arc<ModelHandle>,
    sentiment: SentimentCapability,
}

impl Analyzer {
    pub fn new(
        lexicon: Arc<BiasLexicon>,
        model: Arc<ModelHandle>,
        sentiment: SentimentCapability,
    ) -> Self {
        Self {
            lexicon,
            model,
            sentiment,
        }
    }

    pub fn lexicon(&self) -> &BiasLexicon {
        &self.lexicon
    }

    pub fn model_handle(&self) -> &ModelHandle {
        &self.model
    }

    pub fn sentiment(&self) -> &SentimentCapability {
        &self.sentiment
    }

    /// Classifies `text` and attaches the lexicon hits and sentiment.
    pub fn analyze(&self, text: &str) -> Result<AnalysisReport, AppError> {
        let model = self.model.current()?;
        let prediction = model.predict(text)?;

        let bias_words: Vec<BiasWord> = self
            .lexicon
            .entries_in(text)
            .into_iter()
            .map(|e| BiasWord {
                word: e.word.clone(),
                label: e.label,
                bias_type: e.bias_type.clone(),
                context_notes: e.context_notes.clone(),
            })
            .collect();

        let sentiment = self.sentiment.score(text);
        let summary = format!(
            "Label: {}. Polarity: {:.2}, Subjectivity: {:.2}. Found {} bias-coded words.",
            prediction.label,
            sentiment.polarity,
            sentiment.subjectivity,
            bias_words.len()
        );

        Ok(AnalysisReport {
            label: prediction.label,
            probabilities: prediction.probabilities,
            bias_words,
            sentiment,
            summary,
        })
    }

    /// Lexical report only; works without a trained model.
    pub fn detect_bias_report(&self, text: &str) -> MatchResult {
        detect_bias(text, &self.lexicon)
    }
}
