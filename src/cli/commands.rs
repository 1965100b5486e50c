// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `predict`, and all
// their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::{predict_use_case::PredictConfig, train_use_case::TrainConfig};
use crate::data::encoder::OverflowPolicy;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the CNN spam classifier on a labelled CSV file
    Train(TrainArgs),

    /// Classify a message with a trained checkpoint
    Predict(PredictArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// CSV file with `text` and `label` (spam / not_spam) columns
    #[arg(long, default_value = "data/spam.csv")]
    pub data: String,

    /// Directory to save the model, vocabulary, config and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Pretrained word vectors in fastText `.vec` format
    #[arg(long)]
    pub pretrained: Option<String>,

    /// Keep the embedding table fixed during training
    #[arg(long)]
    pub freeze_embedding: bool,

    /// Embedding width when no pretrained vectors are given
    #[arg(long, default_value_t = 300)]
    pub embed_dim: usize,

    /// Convolution filter widths, e.g. 3,4,5
    #[arg(long, value_delimiter = ',', default_values_t = [3, 4, 5])]
    pub filter_sizes: Vec<usize>,

    /// Number of filters per width, e.g. 100,100,100
    #[arg(long, value_delimiter = ',', default_values_t = [100, 100, 100])]
    pub num_filters: Vec<usize>,

    /// Dropout probability before the output layer
    #[arg(long, default_value_t = 0.5)]
    pub dropout: f64,

    #[arg(long, default_value_t = 50)]
    pub batch_size: usize,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Fraction of messages held out for validation
    #[arg(long, default_value_t = 0.1)]
    pub val_fraction: f64,

    /// Seed for the split, embedding init, weight init, dropout and shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Lowercase messages before tokenising
    #[arg(long)]
    pub lowercase: bool,

    /// Fixed sequence width (default: longest message in the dataset)
    #[arg(long)]
    pub max_len: Option<usize>,

    /// Fail on messages longer than --max-len instead of truncating them
    #[arg(long)]
    pub strict_length: bool,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_path:          a.data,
            checkpoint_dir:     a.checkpoint_dir,
            pretrained_vectors: a.pretrained,
            freeze_embedding:   a.freeze_embedding,
            embed_dim:          a.embed_dim,
            filter_sizes:       a.filter_sizes,
            num_filters:        a.num_filters,
            dropout:            a.dropout,
            batch_size:         a.batch_size,
            epochs:             a.epochs,
            lr:                 a.lr,
            val_fraction:       a.val_fraction,
            seed:               a.seed,
            lowercase:          a.lowercase,
            max_len:            a.max_len,
            overflow:           if a.strict_length { OverflowPolicy::Error } else { OverflowPolicy::Truncate },
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// The message to classify
    #[arg(long)]
    pub text: String,

    /// Directory where the `train` command saved its checkpoint
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Keep the message's case instead of lowercasing it
    #[arg(long)]
    pub keep_case: bool,
}

impl From<PredictArgs> for PredictConfig {
    fn from(a: PredictArgs) -> Self {
        PredictConfig {
            checkpoint_dir: a.checkpoint_dir,
            lowercase:      !a.keep_case,
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    #[test]
    fn test_train_defaults_match_config_defaults() {
        let cli = Cli::try_parse_from(["textcnn-spam", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        let default = TrainConfig::default();
        assert_eq!(cfg.filter_sizes, default.filter_sizes);
        assert_eq!(cfg.num_filters, default.num_filters);
        assert_eq!(cfg.batch_size, default.batch_size);
        assert_eq!(cfg.overflow, OverflowPolicy::Truncate);
        assert!(!cfg.lowercase);
    }

    #[test]
    fn test_filter_lists_are_comma_separated() {
        let cli = Cli::try_parse_from([
            "textcnn-spam", "train", "--filter-sizes", "2,3", "--num-filters", "8,16", "--strict-length",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.filter_sizes, vec![2, 3]);
        assert_eq!(cfg.num_filters, vec![8, 16]);
        assert_eq!(cfg.overflow, OverflowPolicy::Error);
    }

    #[test]
    fn test_predict_lowercases_by_default() {
        let cli = Cli::try_parse_from(["textcnn-spam", "predict", "--text", "WIN NOW"]).unwrap();
        let Commands::Predict(args) = cli.command else { panic!("expected predict") };
        assert_eq!(args.text, "WIN NOW");
        let cfg: PredictConfig = args.into();
        assert!(cfg.lowercase);
    }
}
