//! Bias lexicon: the categorized word/phrase dataset shared by the matcher and the
//! feature extractors.
//!
//! Rows are parsed once into `BiasLexiconEntry` at the load boundary. The derived
//! groupings (by gender, by bias type) are built in `from_entries` and never mutated
//! afterwards, so one `Arc<BiasLexicon>` is shared read-only across requests.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;

const REQUIRED_COLUMNS: &[&str] = &["word", "label", "bias_type"];

/// Gender coding of a lexicon entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenderLabel {
    Male,
    Female,
}

impl GenderLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenderLabel::Male => "male",
            GenderLabel::Female => "female",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "male" => Some(GenderLabel::Male),
            "female" => Some(GenderLabel::Female),
            _ => None,
        }
    }
}

impl fmt::Display for GenderLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single row of the bias lexicon dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiasLexiconEntry {
    pub word: String,
    pub label: GenderLabel,
    /// Category tag, e.g. "age", "cultural", "competition".
    pub bias_type: String,
    pub context_notes: String,
}

/// Raw CSV row before validation. Every field is optional so that one bad row
/// does not abort the whole load.
#[derive(Debug, Deserialize)]
struct RawLexiconRow {
    word: Option<String>,
    label: Option<String>,
    bias_type: Option<String>,
    context_notes: Option<String>,
}

impl RawLexiconRow {
    fn into_entry(self) -> Option<BiasLexiconEntry> {
        let word = non_blank(self.word)?;
        let label = GenderLabel::parse(&non_blank(self.label)?)?;
        let bias_type = non_blank(self.bias_type)?;
        Some(BiasLexiconEntry {
            word,
            label,
            bias_type,
            context_notes: self.context_notes.unwrap_or_default().trim().to_string(),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read-only view over the loaded entries, grouped by gender and by bias type.
#[derive(Debug, Clone, Default)]
pub struct BiasLexicon {
    entries: Vec<BiasLexiconEntry>,
    male_words: BTreeSet<String>,
    female_words: BTreeSet<String>,
    by_type: BTreeMap<String, BTreeSet<String>>,
}

impl BiasLexicon {
    /// Builds the groupings from entries in dataset order. Duplicate words are
    /// collapsed by the sets; a word listed under two bias types appears in both.
    pub fn from_entries(entries: Vec<BiasLexiconEntry>) -> Self {
        let mut male_words = BTreeSet::new();
        let mut female_words = BTreeSet::new();
        let mut by_type: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for entry in &entries {
            match entry.label {
                GenderLabel::Male => male_words.insert(entry.word.clone()),
                GenderLabel::Female => female_words.insert(entry.word.clone()),
            };
            by_type
                .entry(entry.bias_type.clone())
                .or_default()
                .insert(entry.word.clone());
        }

        Self {
            entries,
            male_words,
            female_words,
            by_type,
        }
    }

    /// Loads the lexicon CSV. A missing file, missing required columns, or a file
    /// with no valid rows is a `DataLoad` error.
    pub fn load_csv(path: &Path) -> Result<Self, AppError> {
        let file = std::fs::File::open(path).map_err(|e| {
            AppError::DataLoad(format!("cannot open lexicon {}: {e}", path.display()))
        })?;
        let lexicon = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            entries = lexicon.len(),
            bias_types = lexicon.by_type.len(),
            "Bias lexicon loaded"
        );
        Ok(lexicon)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, AppError> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| AppError::DataLoad(format!("reading lexicon headers: {e}")))?
            .clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == *column) {
                return Err(AppError::DataLoad(format!(
                    "lexicon missing '{column}' column"
                )));
            }
        }

        let mut entries = Vec::new();
        let mut rejected = 0usize;
        for (row_no, result) in reader.deserialize::<RawLexiconRow>().enumerate() {
            let row = result
                .map_err(|e| AppError::DataLoad(format!("lexicon row {row_no}: {e}")))?;
            match row.into_entry() {
                Some(entry) => entries.push(entry),
                None => rejected += 1,
            }
        }

        if rejected > 0 {
            warn!(rejected, "Skipped lexicon rows with missing or invalid fields");
        }
        if entries.is_empty() {
            return Err(AppError::DataLoad("lexicon contains no valid rows".to_string()));
        }

        Ok(Self::from_entries(entries))
    }

    pub fn entries(&self) -> &[BiasLexiconEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn male_words(&self) -> &BTreeSet<String> {
        &self.male_words
    }

    pub fn female_words(&self) -> &BTreeSet<String> {
        &self.female_words
    }

    pub fn by_type(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.by_type
    }

    /// Distinct bias types in sorted order. This is the column order of the bias features.
    pub fn bias_types(&self) -> Vec<String> {
        self.by_type.keys().cloned().collect()
    }

    /// Entries whose lowercased word occurs anywhere in the lowercased text, in
    /// dataset order. Backs the `bias_words` list of an analysis.
    pub fn entries_in<'a>(&'a self, text: &str) -> Vec<&'a BiasLexiconEntry> {
        let text_lower = text.to_lowercase();
        self.entries
            .iter()
            .filter(|e| text_lower.contains(&e.word.to_lowercase()))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn entry(word: &str, label: GenderLabel, bias_type: &str) -> BiasLexiconEntry {
        BiasLexiconEntry {
            word: word.to_string(),
            label,
            bias_type: bias_type.to_string(),
            context_notes: String::new(),
        }
    }

    /// Small lexicon used across the crate's tests.
    pub(crate) fn sample_lexicon() -> BiasLexicon {
        BiasLexicon::from_entries(vec![
            entry("guys", GenderLabel::Male, "gender"),
            entry("aggressive", GenderLabel::Male, "competition"),
            entry("dominate", GenderLabel::Male, "competition"),
            entry("rockstar", GenderLabel::Male, "competition"),
            entry("young", GenderLabel::Male, "age"),
            entry("digital native", GenderLabel::Male, "age"),
            entry("supportive", GenderLabel::Female, "communal"),
            entry("nurturing", GenderLabel::Female, "communal"),
            entry("culture fit", GenderLabel::Male, "cultural"),
        ])
    }

    const CSV: &str = "word,label,bias_type,context_notes\n\
        aggressive,male,competition,Signals combative culture\n\
        supportive,female,communal,\n\
        young,male,age,Age discrimination risk\n\
        ,male,age,blank word\n\
        ninja,unknown,competition,bad label\n";

    #[test]
    fn test_load_from_reader_skips_invalid_rows() {
        let lexicon = BiasLexicon::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(lexicon.len(), 3);
        assert!(lexicon.male_words().contains("aggressive"));
        assert!(lexicon.female_words().contains("supportive"));
        assert_eq!(lexicon.entries()[0].context_notes, "Signals combative culture");
    }

    #[test]
    fn test_missing_required_column_is_data_load_error() {
        let csv = "word,bias_type\naggressive,competition\n";
        let err = BiasLexicon::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::DataLoad(msg) if msg.contains("label")));
    }

    #[test]
    fn test_missing_file_is_data_load_error() {
        let err = BiasLexicon::load_csv(Path::new("/nonexistent/lexicon.csv")).unwrap_err();
        assert!(matches!(err, AppError::DataLoad(_)));
    }

    #[test]
    fn test_no_valid_rows_is_error() {
        let csv = "word,label,bias_type\n,male,age\n";
        assert!(BiasLexicon::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_bias_types_sorted() {
        let lexicon = sample_lexicon();
        assert_eq!(
            lexicon.bias_types(),
            vec!["age", "communal", "competition", "cultural", "gender"]
        );
    }

    #[test]
    fn test_grouping_is_pure_function_of_entries() {
        let a = sample_lexicon();
        let b = BiasLexicon::from_entries(a.entries().to_vec());
        assert_eq!(a.by_type(), b.by_type());
        assert_eq!(a.male_words(), b.male_words());
    }

    #[test]
    fn test_duplicate_words_tolerated() {
        let lexicon = BiasLexicon::from_entries(vec![
            entry("strong", GenderLabel::Male, "competition"),
            entry("strong", GenderLabel::Male, "competition"),
            entry("strong", GenderLabel::Male, "physical"),
        ]);
        assert_eq!(lexicon.male_words().len(), 1);
        assert_eq!(lexicon.by_type()["competition"].len(), 1);
        assert!(lexicon.by_type()["physical"].contains("strong"));
    }

    #[test]
    fn test_entries_in_is_case_insensitive_substring() {
        let lexicon = sample_lexicon();
        let found: Vec<&str> = lexicon
            .entries_in("An AGGRESSIVE Rockstar")
            .iter()
            .map(|e| e.word.as_str())
            .collect();
        assert_eq!(found, vec!["aggressive", "rockstar"]);
    }
}
