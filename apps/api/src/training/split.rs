use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Row indices of a train/test partition, each sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Stratified split: every label keeps its share in both partitions.
///
/// Per label, `round(count * test_size)` rows go to test, clamped so each side
/// keeps at least one row. Labels are visited in sorted order and shuffled with
/// one `StdRng` seeded from `seed`, so the same inputs always give the same split.
pub fn stratified_split(labels: &[String], test_size: f64, seed: u64) -> Result<Split, AppError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(AppError::Configuration(format!(
            "test_size must be in (0, 1), got {test_size}"
        )));
    }

    let mut by_label: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, label) in labels.iter().enumerate() {
        by_label.entry(label.as_str()).or_default().push(idx);
    }

    if let Some((label, rows)) = by_label.iter().find(|(_, rows)| rows.len() < 2) {
        return Err(AppError::Validation(format!(
            "label '{label}' has only {} row(s); a stratified split needs at least 2 per label",
            rows.len()
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for rows in by_label.into_values() {
        let mut rows = rows;
        rows.shuffle(&mut rng);
        let n_test = ((rows.len() as f64 * test_size).round() as usize).clamp(1, rows.len() - 1);
        test.extend_from_slice(&rows[..n_test]);
        train.extend_from_slice(&rows[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok(Split { train, test })
}
