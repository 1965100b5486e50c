// ============================================================
// Layer 4 — Dataset Loader
// ============================================================
// Reads the labelled spam dataset from a CSV file with a
// header row. Two columns are required, in any position:
//
//   text,label
//   "WINNER!! Claim your prize now",spam
//   "Are we still on for lunch?",not_spam
//
// Any other columns are ignored. A missing column or an
// unknown label is a FormatError; an unreadable file is an
// IOError. Nothing is skipped silently.
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;

use crate::domain::sample::{Label, LabeledText};
use crate::domain::traits::DatasetSource;
use crate::error::{ClassifierError, Result};

pub const TEXT_COLUMN: &str = "text";
pub const LABEL_COLUMN: &str = "label";

/// Loads labelled messages from a `text,label` CSV file.
/// Implements the DatasetSource trait from Layer 3.
pub struct CsvDatasetLoader {
    path: PathBuf,
}

impl CsvDatasetLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DatasetSource for CsvDatasetLoader {
    fn load_all(&self) -> Result<Vec<LabeledText>> {
        let file = File::open(&self.path).map_err(|e| ClassifierError::io(&self.path, e))?;
        let samples = read_samples(file)?;

        let spam = samples.iter().filter(|s| s.label == Label::Spam).count();
        tracing::info!(
            "Loaded {} messages from '{}' ({} spam, {} not spam)",
            samples.len(),
            self.path.display(),
            spam,
            samples.len() - spam
        );
        Ok(samples)
    }
}

/// Parse CSV rows from any reader.
pub fn read_samples<R: Read>(reader: R) -> Result<Vec<LabeledText>> {
    let mut csv = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers = csv
        .headers()
        .map_err(|e| ClassifierError::Format(format!("cannot read CSV header: {e}")))?
        .clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| ClassifierError::Format(format!("dataset has no '{name}' column")))
    };
    let text_idx  = column(TEXT_COLUMN)?;
    let label_idx = column(LABEL_COLUMN)?;

    let mut samples = Vec::new();
    for (row, record) in csv.records().enumerate() {
        let record = record
            .map_err(|e| ClassifierError::Format(format!("CSV row {}: {e}", row + 1)))?;

        let field = |idx: usize| {
            record.get(idx).ok_or_else(|| {
                ClassifierError::Format(format!("CSV row {} is missing column {idx}", row + 1))
            })
        };
        let text  = field(text_idx)?;
        let label = field(label_idx)?
            .parse::<Label>()
            .map_err(|e| ClassifierError::Format(format!("CSV row {}: {e}", row + 1)))?;

        samples.push(LabeledText::new(text, label));
    }
    Ok(samples)
}
