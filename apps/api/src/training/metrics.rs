use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Per-class precision/recall/F1 over a held-out set. Zero denominators score 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    pub support: usize,
}

impl ClassificationReport {
    pub fn compute(y_true: &[String], y_pred: &[String]) -> Result<Self, AppError> {
        if y_true.len() != y_pred.len() {
            return Err(AppError::Validation(format!(
                "{} true labels but {} predictions",
                y_true.len(),
                y_pred.len()
            )));
        }
        if y_true.is_empty() {
            return Err(AppError::Validation(
                "cannot evaluate on an empty test set".to_string(),
            ));
        }

        let labels: BTreeSet<&str> = y_true
            .iter()
            .chain(y_pred)
            .map(String::as_str)
            .collect();

        let classes: Vec<ClassMetrics> = labels
            .into_iter()
            .map(|label| {
                let pairs = y_true.iter().zip(y_pred);
                let tp = pairs.clone().filter(|(t, p)| *t == label && *p == label).count();
                let predicted = y_pred.iter().filter(|p| *p == label).count();
                let support = y_true.iter().filter(|t| *t == label).count();
                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    label: label.to_string(),
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let total = y_true.len();
        let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
        let n_classes = classes.len() as f64;

        let macro_avg = AverageMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n_classes,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n_classes,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / n_classes,
        };
        let weighted = |f: fn(&ClassMetrics) -> f64| -> f64 {
            classes.iter().map(|c| f(c) * c.support as f64).sum::<f64>() / total as f64
        };
        let weighted_avg = AverageMetrics {
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1: weighted(|c| c.f1),
        };

        Ok(Self {
            accuracy: ratio(correct, total),
            classes,
            macro_avg,
            weighted_avg,
            support: total,
        })
    }

    pub fn class(&self, label: &str) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.label == label)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.len())
            .chain(["weighted avg".len()])
            .max()
            .unwrap_or(12);

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.label, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.support
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, self.support
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_perfect_predictions() {
        let y = labels(&["neutral", "biased", "toxic", "neutral"]);
        let report = ClassificationReport::compute(&y, &y).unwrap();
        assert_eq!(report.accuracy, 1.0);
        assert!(report.classes.iter().all(|c| c.f1 == 1.0));
        assert_eq!(report.class("neutral").unwrap().support, 2);
    }

    #[test]
    fn test_precision_recall_f1() {
        let y_true = labels(&["biased", "biased", "neutral", "neutral"]);
        let y_pred = labels(&["biased", "neutral", "neutral", "neutral"]);
        let report = ClassificationReport::compute(&y_true, &y_pred).unwrap();

        let biased = report.class("biased").unwrap();
        assert_eq!(biased.precision, 1.0);
        assert_eq!(biased.recall, 0.5);
        assert!((biased.f1 - 2.0 / 3.0).abs() < 1e-12);

        let neutral = report.class("neutral").unwrap();
        assert!((neutral.precision - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(neutral.recall, 1.0);

        assert_eq!(report.accuracy, 0.75);
    }

    #[test]
    fn test_never_predicted_class_scores_zero() {
        let y_true = labels(&["toxic", "neutral"]);
        let y_pred = labels(&["neutral", "neutral"]);
        let report = ClassificationReport::compute(&y_true, &y_pred).unwrap();
        let toxic = report.class("toxic").unwrap();
        assert_eq!(toxic.precision, 0.0);
        assert_eq!(toxic.f1, 0.0);
    }

    #[test]
    fn test_display_lists_every_class() {
        let y = labels(&["neutral", "biased", "toxic"]);
        let rendered = ClassificationReport::compute(&y, &y).unwrap().to_string();
        for needle in ["neutral", "biased", "toxic", "accuracy", "macro avg", "weighted avg"] {
            assert!(rendered.contains(needle), "missing {needle}");
        }
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = ClassificationReport::compute(&labels(&["a"]), &labels(&[])).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
