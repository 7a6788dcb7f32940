use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;

const REQUIRED_COLUMNS: &[&str] = &["text", "label"];

/// One labeled training row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledText {
    pub text: String,
    pub label: String,
}

#[derive(Debug, Deserialize)]
struct RawCorpusRow {
    text: Option<String>,
    label: Option<String>,
}

/// Loads the labeled corpus CSV. Missing `text`/`label` columns are fatal; rows
/// with an empty text or label are dropped.
pub fn load_corpus(path: &Path) -> Result<Vec<LabeledText>, AppError> {
    let file = std::fs::File::open(path)
        .map_err(|e| AppError::DataLoad(format!("cannot open corpus {}: {e}", path.display())))?;
    let rows = read_corpus(file)?;
    info!(path = %path.display(), rows = rows.len(), "Training corpus loaded");
    Ok(rows)
}

pub fn read_corpus<R: Read>(reader: R) -> Result<Vec<LabeledText>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::DataLoad(format!("reading corpus headers: {e}")))?
        .clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == *column) {
            return Err(AppError::DataLoad(format!("corpus missing '{column}' column")));
        }
    }

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for (row_no, result) in reader.deserialize::<RawCorpusRow>().enumerate() {
        let raw = result.map_err(|e| AppError::DataLoad(format!("corpus row {row_no}: {e}")))?;
        let text = raw.text.filter(|t| !t.trim().is_empty());
        let label = raw
            .label
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());
        match (text, label) {
            (Some(text), Some(label)) => rows.push(LabeledText { text, label }),
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        warn!(dropped, "Dropped corpus rows with missing text or label");
    }
    if rows.is_empty() {
        return Err(AppError::DataLoad("corpus contains no usable rows".to_string()));
    }
    Ok(rows)
}

/// Label → row count, sorted by label.
pub fn label_distribution(rows: &[LabeledText]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for row in rows {
        *counts.entry(row.label.clone()).or_insert(0) += 1;
    }
    counts
}
