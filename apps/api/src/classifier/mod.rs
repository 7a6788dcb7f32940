//! Multinomial logistic regression over composed features.
//!
//! Fitting minimises the class-weighted mean cross-entropy plus an L2 penalty on
//! the weights (not the intercepts), scaled so that `c` plays the role of the
//! usual inverse regularisation strength. Full-batch gradient descent with
//! Armijo backtracking; stops when the largest gradient component drops below
//! `tol` or after `max_iter` iterations. No randomness anywhere.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{ClassWeight, TrainingConfig};
use crate::errors::AppError;

const ARMIJO: f64 = 1e-4;
const MAX_BACKTRACKS: usize = 60;
const MAX_STEP: f64 = 1e4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierParams {
    pub max_iter: usize,
    pub c: f64,
    pub tol: f64,
    pub class_weight: ClassWeight,
}

impl From<&TrainingConfig> for ClassifierParams {
    fn from(config: &TrainingConfig) -> Self {
        Self {
            max_iter: config.max_iter,
            c: config.c,
            tol: config.tol,
            class_weight: config.class_weight,
        }
    }
}

/// Outcome of the optimisation loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    pub iterations: usize,
    pub converged: bool,
    pub final_loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Sorted label names. Row `k` of `weights` and entry `k` of every
    /// probability vector belong to `classes[k]`.
    classes: Vec<String>,
    weights: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
    n_features: usize,
}

impl LogisticRegression {
    pub fn fit(
        x: &[Vec<f64>],
        y: &[String],
        params: &ClassifierParams,
    ) -> Result<(Self, FitSummary), AppError> {
        if x.is_empty() {
            return Err(AppError::Validation("cannot fit on zero rows".to_string()));
        }
        if x.len() != y.len() {
            return Err(AppError::Validation(format!(
                "{} feature rows but {} labels",
                x.len(),
                y.len()
            )));
        }
        let n_features = x[0].len();
        if let Some(bad) = x.iter().find(|row| row.len() != n_features) {
            return Err(AppError::DimensionMismatch {
                expected: n_features,
                actual: bad.len(),
            });
        }

        let classes: Vec<String> = y.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect();
        if classes.len() < 2 {
            return Err(AppError::Validation(format!(
                "need at least two distinct labels to fit, got {}",
                classes.len()
            )));
        }
        let class_index: BTreeMap<&str, usize> = classes
            .iter()
            .enumerate()
            .map(|(k, c)| (c.as_str(), k))
            .collect();
        let targets: Vec<usize> = y.iter().map(|label| class_index[label.as_str()]).collect();
        let sample_weights = sample_weights(&targets, classes.len(), params.class_weight);

        let problem = Problem {
            x,
            targets: &targets,
            sample_weights: &sample_weights,
            total_weight: sample_weights.iter().sum(),
            n_classes: classes.len(),
            n_features,
            c: params.c,
        };

        let mut model = Self {
            weights: vec![vec![0.0; n_features]; classes.len()],
            intercepts: vec![0.0; classes.len()],
            classes,
            n_features,
        };

        let summary = problem.minimise(&mut model, params);
        if summary.converged {
            info!(
                iterations = summary.iterations,
                loss = summary.final_loss,
                "Logistic regression converged"
            );
        } else {
            warn!(
                max_iter = params.max_iter,
                loss = summary.final_loss,
                "Logistic regression did not converge; consider raising max_iter"
            );
        }
        Ok((model, summary))
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    fn check_width(&self, features: &[f64]) -> Result<(), AppError> {
        if features.len() != self.n_features {
            return Err(AppError::DimensionMismatch {
                expected: self.n_features,
                actual: features.len(),
            });
        }
        Ok(())
    }

    fn logits(&self, features: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.intercepts)
            .map(|(w, b)| dot(w, features) + b)
            .collect()
    }

    /// Probabilities aligned with `classes()`.
    pub fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, AppError> {
        self.check_width(features)?;
        Ok(softmax(&self.logits(features)))
    }

    /// Label → probability. Sums to 1 within floating tolerance.
    pub fn predict_probabilities(&self, features: &[f64]) -> Result<BTreeMap<String, f64>, AppError> {
        let proba = self.predict_proba(features)?;
        Ok(self.classes.iter().cloned().zip(proba).collect())
    }

    /// The most probable label; ties go to the earlier class.
    pub fn predict(&self, features: &[f64]) -> Result<String, AppError> {
        let proba = self.predict_proba(features)?;
        Ok(self.classes[argmax(&proba)].clone())
    }
}

/// Balanced weights are `n / (k * count_c)`; uniform weights are 1.
fn sample_weights(targets: &[usize], n_classes: usize, mode: ClassWeight) -> Vec<f64> {
    match mode {
        ClassWeight::Uniform => vec![1.0; targets.len()],
        ClassWeight::Balanced => {
            let mut counts = vec![0usize; n_classes];
            for &t in targets {
                counts[t] += 1;
            }
            let n = targets.len() as f64;
            let class_weights: Vec<f64> = counts
                .iter()
                .map(|&c| if c == 0 { 0.0 } else { n / (n_classes as f64 * c as f64) })
                .collect();
            targets.iter().map(|&t| class_weights[t]).collect()
        }
    }
}

struct Problem<'a> {
    x: &'a [Vec<f64>],
    targets: &'a [usize],
    sample_weights: &'a [f64],
    total_weight: f64,
    n_classes: usize,
    n_features: usize,
    c: f64,
}

struct Gradient {
    weights: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
}

impl Gradient {
    fn squared_norm(&self) -> f64 {
        self.weights.iter().flatten().map(|g| g * g).sum::<f64>()
            + self.intercepts.iter().map(|g| g * g).sum::<f64>()
    }

    fn max_abs(&self) -> f64 {
        self.weights
            .iter()
            .flatten()
            .chain(&self.intercepts)
            .fold(0.0_f64, |acc, g| acc.max(g.abs()))
    }
}

impl Problem<'_> {
    fn penalty_scale(&self) -> f64 {
        1.0 / (self.c * self.total_weight)
    }

    fn loss(&self, model: &LogisticRegression) -> f64 {
        let mut data_loss = 0.0;
        for ((row, &target), &sw) in self.x.iter().zip(self.targets).zip(self.sample_weights) {
            let logits = model.logits(row);
            data_loss += sw * (log_sum_exp(&logits) - logits[target]);
        }
        let l2: f64 = model.weights.iter().flatten().map(|w| w * w).sum();
        data_loss / self.total_weight + 0.5 * self.penalty_scale() * l2
    }

    fn gradient(&self, model: &LogisticRegression) -> Gradient {
        let mut grad = Gradient {
            weights: vec![vec![0.0; self.n_features]; self.n_classes],
            intercepts: vec![0.0; self.n_classes],
        };

        for ((row, &target), &sw) in self.x.iter().zip(self.targets).zip(self.sample_weights) {
            let proba = softmax(&model.logits(row));
            for (k, p) in proba.iter().enumerate() {
                let residual = sw * (p - if k == target { 1.0 } else { 0.0 }) / self.total_weight;
                if residual == 0.0 {
                    continue;
                }
                grad.intercepts[k] += residual;
                for (g, xj) in grad.weights[k].iter_mut().zip(row) {
                    *g += residual * xj;
                }
            }
        }

        let scale = self.penalty_scale();
        for (g_row, w_row) in grad.weights.iter_mut().zip(&model.weights) {
            for (g, w) in g_row.iter_mut().zip(w_row) {
                *g += scale * w;
            }
        }
        grad
    }

    fn minimise(&self, model: &mut LogisticRegression, params: &ClassifierParams) -> FitSummary {
        let mut loss = self.loss(model);
        let mut step = 1.0_f64;

        for iteration in 1..=params.max_iter {
            let grad = self.gradient(model);
            if grad.max_abs() < params.tol {
                return FitSummary {
                    iterations: iteration - 1,
                    converged: true,
                    final_loss: loss,
                };
            }

            let grad_sq = grad.squared_norm();
            step = (step * 2.0).min(MAX_STEP);
            let mut accepted = false;
            for _ in 0..MAX_BACKTRACKS {
                let candidate = model.stepped(&grad, step);
                let candidate_loss = self.loss(&candidate);
                if candidate_loss <= loss - ARMIJO * step * grad_sq {
                    *model = candidate;
                    loss = candidate_loss;
                    accepted = true;
                    break;
                }
                step *= 0.5;
            }

            if !accepted {
                // No descent possible at machine precision.
                debug!(iteration, loss, "Line search exhausted");
                return FitSummary {
                    iterations: iteration,
                    converged: true,
                    final_loss: loss,
                };
            }
            if iteration % 100 == 0 {
                debug!(iteration, loss, step, "Optimiser progress");
            }
        }

        FitSummary {
            iterations: params.max_iter,
            converged: false,
            final_loss: loss,
        }
    }
}

impl LogisticRegression {
    fn stepped(&self, grad: &Gradient, step: f64) -> Self {
        let weights = self
            .weights
            .iter()
            .zip(&grad.weights)
            .map(|(w_row, g_row)| w_row.iter().zip(g_row).map(|(w, g)| w - step * g).collect())
            .collect();
        let intercepts = self
            .intercepts
            .iter()
            .zip(&grad.intercepts)
            .map(|(b, g)| b - step * g)
            .collect();
        Self {
            classes: self.classes.clone(),
            weights,
            intercepts,
            n_features: self.n_features,
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|v| (v - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0
}
