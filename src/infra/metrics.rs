// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:        the epoch number (1, 2, 3, ...)
//   - train_loss:   mean cross-entropy over training batches
//   - val_loss:     mean cross-entropy over validation batches
//   - val_acc:      % of validation examples classified correctly
//   - elapsed_secs: wall-clock time spent on the epoch
//
// Output file: {checkpoint_dir}/metrics.csv
//
// Example CSV output:
//   epoch,train_loss,val_loss,val_acc,elapsed_secs
//   1,0.412345,0.301234,89.250000,12.31
//   2,0.254321,0.250012,91.500000,12.08
//
// Runs without a validation split leave val_loss and val_acc
// empty. Each training run starts a fresh file.
//
// Reference: Rust Book §12 (I/O and File Handling)

use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, Result};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Average cross-entropy loss over all training batches
    pub train_loss: f64,

    /// Average cross-entropy loss on the validation set
    pub val_loss: Option<f64>,

    /// Validation accuracy in percent, range [0, 100]
    pub val_acc: Option<f64>,

    pub elapsed_secs: f64,
}

impl EpochMetrics {
    pub fn new(
        epoch:        usize,
        train_loss:   f64,
        val_loss:     Option<f64>,
        val_acc:      Option<f64>,
        elapsed_secs: f64,
    ) -> Self {
        Self { epoch, train_loss, val_loss, val_acc, elapsed_secs }
    }

    /// Returns true if this epoch beat the best validation accuracy so far
    pub fn is_improvement(&self, best_val_acc: Option<f64>) -> bool {
        match (self.val_acc, best_val_acc) {
            (Some(acc), Some(best)) => acc > best,
            (Some(_), None)         => true,
            (None, _)               => false,
        }
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    writer:   csv::Writer<File>,
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create `{dir}/metrics.csv`, replacing any file left by an
    /// earlier run. The header row is written with the first record.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| ClassifierError::io(dir, e))?;

        let csv_path = dir.join("metrics.csv");
        let file = File::create(&csv_path).map_err(|e| ClassifierError::io(&csv_path, e))?;

        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        Ok(Self { writer: csv::Writer::from_writer(file), csv_path })
    }

    /// Append one epoch's metrics as a new row and flush it to disk.
    pub fn log(&mut self, m: &EpochMetrics) -> Result<()> {
        self.writer
            .serialize(m)
            .map_err(|e| ClassifierError::Checkpoint(format!("cannot write metrics row: {e}")))?;
        self.writer
            .flush()
            .map_err(|e| ClassifierError::io(&self.csv_path, e))?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_acc={:?}",
            m.epoch,
            m.train_loss,
            m.val_acc,
        );
        Ok(())
    }

    /// Return the path to the metrics CSV file
    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
