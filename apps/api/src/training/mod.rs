//! Offline training: corpus → stratified split → fit composer + classifier →
//! evaluate on the held-out rows → one `TrainedModel`.

pub mod corpus;
pub mod metrics;
pub mod split;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::classifier::{ClassifierParams, FitSummary, LogisticRegression};
use crate::config::TrainingConfig;
use crate::errors::AppError;
use crate::features::{FeatureComposer, SentimentCapability};
use crate::lexicon::BiasLexicon;
use crate::model::TrainedModel;

pub use corpus::{label_distribution, load_corpus, read_corpus, LabeledText};
pub use metrics::ClassificationReport;
pub use split::{stratified_split, Split};

/// Everything a training run produces.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: TrainedModel,
    pub report: ClassificationReport,
    pub split: Split,
    pub fit: FitSummary,
    pub label_distribution: BTreeMap<String, usize>,
}

/// Serializable summary for logs and the CLI.
#[derive(Debug, Serialize)]
pub struct TrainingSummary<'a> {
    pub train_rows: usize,
    pub test_rows: usize,
    pub feature_width: usize,
    pub iterations: usize,
    pub converged: bool,
    pub label_distribution: &'a BTreeMap<String, usize>,
    pub report: &'a ClassificationReport,
}

impl TrainingOutcome {
    pub fn summary(&self) -> TrainingSummary<'_> {
        TrainingSummary {
            train_rows: self.split.train.len(),
            test_rows: self.split.test.len(),
            feature_width: self.model.layout().total_width,
            iterations: self.fit.iterations,
            converged: self.fit.converged,
            label_distribution: &self.label_distribution,
            report: &self.report,
        }
    }
}

/// Fits the feature composer and classifier on the training split and evaluates
/// on the test split. Deterministic for a fixed `config.seed`.
pub fn train(
    corpus: &[LabeledText],
    lexicon: &BiasLexicon,
    sentiment: SentimentCapability,
    config: &TrainingConfig,
) -> Result<TrainingOutcome, AppError> {
    config.validate()?;
    if lexicon.is_empty() {
        return Err(AppError::DataLoad("bias lexicon is empty".to_string()));
    }
    if corpus.is_empty() {
        return Err(AppError::DataLoad("training corpus is empty".to_string()));
    }

    let labels: Vec<String> = corpus.iter().map(|row| row.label.clone()).collect();
    let split = stratified_split(&labels, config.test_size, config.seed)?;
    info!(
        train = split.train.len(),
        test = split.test.len(),
        seed = config.seed,
        "Stratified split"
    );

    let pick = |indices: &[usize]| -> (Vec<String>, Vec<String>) {
        indices
            .iter()
            .map(|&i| (corpus[i].text.clone(), corpus[i].label.clone()))
            .unzip()
    };
    let (train_texts, train_labels) = pick(&split.train);
    let (test_texts, test_labels) = pick(&split.test);

    let mut composer = FeatureComposer::new(lexicon, sentiment, config.max_features);
    composer.fit(&train_texts)?;
    let train_features = composer.transform(&train_texts)?;
    info!(
        width = composer.width().unwrap_or(0),
        "Feature composer fitted"
    );

    let (classifier, fit) =
        LogisticRegression::fit(&train_features, &train_labels, &ClassifierParams::from(config))?;

    let model = TrainedModel::new(composer, classifier)?;
    let predictions = model.predict_batch(&test_texts)?;
    let predicted_labels: Vec<String> = predictions.into_iter().map(|p| p.label).collect();
    let report = ClassificationReport::compute(&test_labels, &predicted_labels)?;
    info!(accuracy = report.accuracy, "Evaluation on held-out split");

    let label_distribution = label_distribution(corpus);

    Ok(TrainingOutcome {
        model,
        report,
        split,
        fit,
        label_distribution,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::lexicon::tests::sample_lexicon;

    const NEUTRAL: &[&str] = &[
        "Seeking qualified candidates with excellent communication skills",
        "We offer flexible hours and a collaborative team environment",
        "Responsibilities include maintaining documentation and reviewing code",
        "Applicants should have experience with databases and testing",
        "The role involves planning releases with product managers",
        "Candidates of all backgrounds are encouraged to apply",
    ];
    const BIASED: &[&str] = &[
        "Guys we want an aggressive rockstar to dominate the market",
        "Looking for a young rockstar who can dominate deadlines",
        "Aggressive young guys who dominate and crush competition",
        "We need a rockstar ninja, young and aggressive",
    ];
    const TOXIC: &[&str] = &[
        "Only young guys need apply, no family commitments, toxic hours",
        "Brutal toxic culture, young guys only, dominate or leave",
    ];

    /// Each cycle adds 10 rows in a 6/3/1 neutral/biased/toxic ratio.
    pub(crate) fn synthetic_corpus(cycles: usize) -> Vec<LabeledText> {
        let mut rows = Vec::new();
        for i in 0..cycles {
            for j in 0..6 {
                rows.push(LabeledText {
                    text: format!("{} (ref {i}-{j})", NEUTRAL[(i + j) % NEUTRAL.len()]),
                    label: "neutral".to_string(),
                });
            }
            for j in 0..3 {
                rows.push(LabeledText {
                    text: format!("{} (ref {i}-{j})", BIASED[(i + j) % BIASED.len()]),
                    label: "biased".to_string(),
                });
            }
            rows.push(LabeledText {
                text: format!("{} (ref {i})", TOXIC[i % TOXIC.len()]),
                label: "toxic".to_string(),
            });
        }
        rows
    }

    fn quick_config() -> TrainingConfig {
        TrainingConfig {
            max_iter: 300,
            max_features: 200,
            ..Default::default()
        }
    }

    #[test]
    fn test_end_to_end_training() {
        let corpus = synthetic_corpus(10);
        let outcome = train(
            &corpus,
            &sample_lexicon(),
            SentimentCapability::builtin(),
            &quick_config(),
        )
        .unwrap();

        assert_eq!(outcome.split.train.len() + outcome.split.test.len(), 100);
        let test_labels: Vec<&str> = outcome
            .split
            .test
            .iter()
            .map(|&i| corpus[i].label.as_str())
            .collect();
        let count = |l: &str| test_labels.iter().filter(|t| **t == l).count();
        assert!(count("neutral").abs_diff(12) <= 1);
        assert!(count("biased").abs_diff(6) <= 1);
        assert!(count("toxic").abs_diff(2) <= 1);

        assert_eq!(outcome.label_distribution["neutral"], 60);
        assert_eq!(outcome.report.support, outcome.split.test.len());
        assert_eq!(
            outcome.model.classes(),
            &["biased".to_string(), "neutral".to_string(), "toxic".to_string()][..]
        );
        assert!(outcome.report.accuracy > 0.5, "accuracy {}", outcome.report.accuracy);
    }

    #[test]
    fn test_training_is_reproducible() {
        let corpus = synthetic_corpus(5);
        let run = || {
            train(
                &corpus,
                &sample_lexicon(),
                SentimentCapability::builtin(),
                &quick_config(),
            )
            .unwrap()
        };
        let a = run();
        let b = run();
        assert_eq!(a.split, b.split);
        assert_eq!(a.report, b.report);
    }

    #[test]
    fn test_empty_lexicon_is_fatal() {
        let err = train(
            &synthetic_corpus(2),
            &BiasLexicon::default(),
            SentimentCapability::builtin(),
            &quick_config(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::DataLoad(_)));
    }
}
