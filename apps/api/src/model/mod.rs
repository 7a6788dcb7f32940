//! Trained model artifact and the process-wide handle used to swap it.
//!
//! The artifact is one bincode file holding the fitted composer, the classifier
//! and the feature layout. Writes go to a temp file in the target directory and
//! are renamed into place, so readers never see a partial file. In memory the
//! current model sits behind `ModelHandle`; a reload replaces the whole `Arc`.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::classifier::LogisticRegression;
use crate::errors::AppError;
use crate::features::{FeatureComposer, FeatureLayout, SentimentCapability};
use crate::lexicon::BiasLexicon;

/// Bumped whenever the serialized layout changes.
pub const FORMAT_VERSION: u32 = 1;

/// A single classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub probabilities: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    format_version: u32,
    layout: FeatureLayout,
    composer: FeatureComposer,
    classifier: LogisticRegression,
}

impl TrainedModel {
    pub fn new(composer: FeatureComposer, classifier: LogisticRegression) -> Result<Self, AppError> {
        let layout = composer.layout()?;
        if layout.total_width != classifier.n_features() {
            return Err(AppError::DimensionMismatch {
                expected: classifier.n_features(),
                actual: layout.total_width,
            });
        }
        Ok(Self {
            format_version: FORMAT_VERSION,
            layout,
            composer,
            classifier,
        })
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    pub fn classes(&self) -> &[String] {
        self.classifier.classes()
    }

    pub fn predict(&self, text: &str) -> Result<Prediction, AppError> {
        let mut predictions = self.predict_batch(&[text.to_string()])?;
        predictions
            .pop()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("empty prediction batch")))
    }

    pub fn predict_batch(&self, texts: &[String]) -> Result<Vec<Prediction>, AppError> {
        let features = self.composer.transform(texts)?;
        features
            .iter()
            .map(|row| {
                if row.len() != self.layout.total_width {
                    return Err(AppError::DimensionMismatch {
                        expected: self.layout.total_width,
                        actual: row.len(),
                    });
                }
                let probabilities = self.classifier.predict_probabilities(row)?;
                let label = self.classifier.predict(row)?;
                Ok(Prediction {
                    label,
                    probabilities,
                })
            })
            .collect()
    }

    /// Writes the artifact atomically: temp file in the same directory, then rename.
    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let bytes = bincode::serialize(self)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| AppError::Io(e.error))?;

        info!(path = %path.display(), bytes = bytes.len(), "Model artifact written");
        Ok(())
    }

    /// Reads a whole artifact and binds the runtime sentiment capability.
    pub fn load(path: &Path, sentiment: SentimentCapability) -> Result<Self, AppError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes, sentiment)
    }

    pub fn from_bytes(bytes: &[u8], sentiment: SentimentCapability) -> Result<Self, AppError> {
        let mut model: Self = bincode::deserialize(bytes)?;
        if model.format_version != FORMAT_VERSION {
            return Err(AppError::Serialization(format!(
                "unsupported model format version {} (expected {FORMAT_VERSION})",
                model.format_version
            )));
        }
        if !model.composer.is_fitted() {
            return Err(AppError::Serialization(
                "artifact holds an unfitted feature composer".to_string(),
            ));
        }
        if model.layout.sentiment_available && !sentiment.is_available() {
            warn!("Model was trained with live sentiment features; serving with zeros");
        }
        model.composer.bind_sentiment(sentiment);
        Ok(model)
    }

    /// Warns when the live lexicon's categories differ from the ones baked into
    /// the model. The model keeps using its own snapshot.
    pub fn check_lexicon(&self, lexicon: &BiasLexicon) -> bool {
        let live = lexicon.bias_types();
        let matches = live == self.layout.bias_types;
        if !matches {
            warn!(
                model = ?self.layout.bias_types,
                live = ?live,
                "Bias lexicon categories differ from the trained model's"
            );
        }
        matches
    }
}

/// Shared slot for the current model. Readers clone the `Arc`; `replace` swaps it whole.
#[derive(Debug, Default)]
pub struct ModelHandle {
    current: RwLock<Option<Arc<TrainedModel>>>,
}

impl ModelHandle {
    pub fn new(model: Option<TrainedModel>) -> Self {
        Self {
            current: RwLock::new(model.map(Arc::new)),
        }
    }

    pub fn current(&self) -> Result<Arc<TrainedModel>, AppError> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        guard.clone().ok_or(AppError::ModelNotLoaded)
    }

    pub fn is_loaded(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    pub fn replace(&self, model: TrainedModel) {
        let next = Arc::new(model);
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(next);
    }

    /// Loads a new artifact fully before swapping; on failure the old model stays.
    pub fn reload(&self, path: &Path, sentiment: SentimentCapability) -> Result<(), AppError> {
        let model = TrainedModel::load(path, sentiment)?;
        self.replace(model);
        info!(path = %path.display(), "Model swapped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainingConfig;
    use crate::lexicon::tests::{entry, sample_lexicon};
    use crate::lexicon::GenderLabel;
    use crate::training::tests::synthetic_corpus;
    use crate::training::train;

    fn trained() -> TrainedModel {
        let config = TrainingConfig {
            max_iter: 200,
            max_features: 100,
            ..Default::default()
        };
        train(
            &synthetic_corpus(3),
            &sample_lexicon(),
            SentimentCapability::builtin(),
            &config,
        )
        .unwrap()
        .model
    }

    #[test]
    fn test_save_and_load_predict_identically() {
        let model = trained();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("bias_model.bin");
        model.save(&path).unwrap();

        let loaded = TrainedModel::load(&path, SentimentCapability::builtin()).unwrap();
        let text = "Guys, we want an aggressive rockstar";
        assert_eq!(model.predict(text).unwrap(), loaded.predict(text).unwrap());
        assert_eq!(loaded.layout(), model.layout());
    }

    #[test]
    fn test_probabilities_sum_to_one_for_any_text() {
        let model = trained();
        for text in ["", "????", "young guys", "A supportive and inclusive team"] {
            let prediction = model.predict(text).unwrap();
            let total: f64 = prediction.probabilities.values().sum();
            assert!((total - 1.0).abs() < 1e-6);
            assert!(prediction.probabilities.contains_key(&prediction.label));
        }
    }

    #[test]
    fn test_corrupt_artifact_rejected() {
        let err = TrainedModel::from_bytes(b"not a model", SentimentCapability::builtin())
            .unwrap_err();
        assert!(matches!(err, AppError::Serialization(_)));
    }

    #[test]
    fn test_handle_without_model_reports_not_loaded() {
        let handle = ModelHandle::default();
        assert!(!handle.is_loaded());
        assert!(matches!(handle.current(), Err(AppError::ModelNotLoaded)));
    }

    #[test]
    fn test_replace_swaps_whole_model() {
        let handle = ModelHandle::new(Some(trained()));
        let before = handle.current().unwrap();
        handle.replace(trained());
        let after = handle.current().unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        // in-flight readers keep the old model intact
        assert!(before.predict("young guys").is_ok());
    }

    #[test]
    fn test_failed_reload_keeps_previous_model() {
        let handle = ModelHandle::new(Some(trained()));
        let before = handle.current().unwrap();
        let err = handle
            .reload(Path::new("/nonexistent/model.bin"), SentimentCapability::builtin())
            .unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
        assert!(Arc::ptr_eq(&before, &handle.current().unwrap()));
    }

    #[test]
    fn test_check_lexicon_detects_category_skew() {
        let model = trained();
        assert!(model.check_lexicon(&sample_lexicon()));
        let other = BiasLexicon::from_entries(vec![entry("elite", GenderLabel::Male, "class")]);
        assert!(!model.check_lexicon(&other));
    }
}
