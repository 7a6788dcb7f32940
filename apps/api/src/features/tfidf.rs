//! TF-IDF term weighting over a bounded vocabulary.
//!
//! - tokens: lowercase runs of two or more word characters, English stop words removed
//! - vocabulary: the `max_features` most frequent terms across the fitted corpus
//!   (ties broken alphabetically), columns in alphabetical order
//! - idf: `ln((1 + n_docs) / (1 + df)) + 1`
//! - rows: raw term counts × idf, L2-normalised

use std::collections::{BTreeMap, HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::features::stopwords::is_stop_word;
use crate::features::{FeatureMatrix, FeatureTransform};

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    max_features: usize,
    /// term → column index. Empty until fitted.
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
    fitted: bool,
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            vocabulary: BTreeMap::new(),
            idf: Vec::new(),
            fitted: false,
        }
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    pub fn tokenize(text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        TOKEN
            .find_iter(&lower)
            .map(|m| m.as_str())
            .filter(|t| !is_stop_word(t))
            .map(str::to_string)
            .collect()
    }

    fn row(&self, text: &str) -> Vec<f64> {
        let mut row = vec![0.0; self.vocabulary.len()];
        for token in Self::tokenize(text) {
            if let Some(&idx) = self.vocabulary.get(&token) {
                row[idx] += 1.0;
            }
        }

        for (value, idf) in row.iter_mut().zip(&self.idf) {
            *value *= idf;
        }

        let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in &mut row {
                *value /= norm;
            }
        }
        row
    }
}

impl FeatureTransform for TfidfVectorizer {
    fn name(&self) -> &'static str {
        "tfidf"
    }

    fn fit(&mut self, texts: &[String]) -> Result<(), AppError> {
        if texts.is_empty() {
            return Err(AppError::Configuration(
                "cannot fit TF-IDF on an empty corpus".to_string(),
            ));
        }

        let mut term_freq: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for text in texts {
            let tokens = Self::tokenize(text);
            let unique: HashSet<&String> = tokens.iter().collect();
            for term in unique {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
            for term in tokens {
                *term_freq.entry(term).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = term_freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.max_features);

        let kept: BTreeMap<String, usize> = ranked
            .into_iter()
            .map(|(term, _)| {
                let df = doc_freq.get(&term).copied().unwrap_or(0);
                (term, df)
            })
            .collect();

        let n_docs = texts.len() as f64;
        self.vocabulary = kept
            .keys()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx))
            .collect();
        self.idf = kept
            .values()
            .map(|&df| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
            .collect();
        self.fitted = true;

        Ok(())
    }

    fn transform(&self, texts: &[String]) -> Result<FeatureMatrix, AppError> {
        if !self.fitted {
            return Err(AppError::Configuration(
                "TF-IDF transform called before fit".to_string(),
            ));
        }
        Ok(texts.iter().map(|t| self.row(t)).collect())
    }

    fn width(&self) -> Option<usize> {
        self.fitted.then_some(self.vocabulary.len())
    }
}
