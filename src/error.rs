// ============================================================
// Cross-cutting — Error Types
// ============================================================
// One error enum for every layer below the application layer.
// The variants separate data problems (Format, Vocabulary)
// from model-configuration problems (Shape, InvalidConfig)
// so callers can tell them apart. All of them abort a run.
//
// The application and CLI layers wrap these in anyhow::Error
// with extra context, the same way they wrap I/O failures.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading data, building the model,
/// training or predicting.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ClassifierError {
    /// Malformed pretrained-vector file or dataset schema.
    #[error("Format error: {0}")]
    Format(String),

    /// Tensor or sequence shape does not fit the model, e.g. a
    /// sequence shorter than the widest filter or a batch whose
    /// label count differs from its row count.
    #[error("Shape error: {0}")]
    Shape(String),

    /// A token id falls outside the embedding table.
    #[error("Vocabulary error: id {id} is outside a vocabulary of {vocab_size} entries")]
    Vocabulary {
        /// The offending id.
        id: u32,
        /// Number of rows in the vocabulary / embedding table.
        vocab_size: usize,
    },

    /// Hyperparameters rejected at construction time.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A file could not be read or written.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Saving or restoring a checkpoint failed.
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),
}

impl ClassifierError {
    /// Build an [`Io`](Self::Io) error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// Result alias used by the data, ml and infra layers.
pub type Result<T> = std::result::Result<T, ClassifierError>;
