// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the labelled CSV          (Layer 4 - data)
//   Step 2: Tokenise + build vocabulary    (Layer 4 - data)
//   Step 3: Encode to fixed-width id rows  (Layer 4 - data)
//   Step 4: Split train/validation         (Layer 4 - data)
//   Step 5: Build the embedding table      (Layer 4 - data)
//   Step 6: Save config + vocabulary       (Layer 6 - infra)
//   Step 7: Run training loop              (Layer 5 - ml)
//
// The vocabulary is built once from the whole corpus before the
// split, so train, validation and prediction share one id space.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{bail, Context, Result};
use burn::module::AutodiffModule;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::ClassificationDataset,
    embeddings::EmbeddingTable,
    encoder::{Encoder, OverflowPolicy},
    loader::CsvDatasetLoader,
    splitter::split_train_val,
    tokenizer::WordTokenizer,
};
use crate::domain::{sample::Label, traits::DatasetSource};
use crate::infra::{
    checkpoint::{CheckpointConfig, CheckpointManager},
    metrics::MetricsLogger,
};
use crate::ml::{
    model::CnnClassifierConfig,
    trainer::{run_training, TrainReport},
    TrainBackend,
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Saved inside train_config.json so a checkpoint records how it was made.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// CSV file with `text` and `label` columns
    pub data_path:          String,
    pub checkpoint_dir:     String,
    /// fastText `.vec` file; random embeddings when absent
    pub pretrained_vectors: Option<String>,
    /// Keep the embedding table fixed during training
    pub freeze_embedding:   bool,
    /// Embedding width when no pretrained vectors are given
    pub embed_dim:          usize,
    pub filter_sizes:       Vec<usize>,
    pub num_filters:        Vec<usize>,
    pub dropout:            f64,
    pub batch_size:         usize,
    pub epochs:             usize,
    pub lr:                 f64,
    /// Fraction of examples held out for validation
    pub val_fraction:       f64,
    pub seed:               u64,
    pub lowercase:          bool,
    /// Fixed sequence width; the longest tokenised message when absent
    pub max_len:            Option<usize>,
    pub overflow:           OverflowPolicy,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path:          "data/spam.csv".to_string(),
            checkpoint_dir:     "checkpoints".to_string(),
            pretrained_vectors: None,
            freeze_embedding:   false,
            embed_dim:          300,
            filter_sizes:       vec![3, 4, 5],
            num_filters:        vec![100, 100, 100],
            dropout:            0.5,
            batch_size:         50,
            epochs:             10,
            lr:                 1e-3,
            val_fraction:       0.1,
            seed:               42,
            lowercase:          false,
            max_len:            None,
            overflow:           OverflowPolicy::Truncate,
        }
    }
}

impl TrainConfig {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if self.epochs == 0 {
            bail!("epochs must be at least 1");
        }
        if !(self.lr > 0.0) {
            bail!("learning rate must be positive, got {}", self.lr);
        }
        if !(0.0..1.0).contains(&self.val_fraction) {
            bail!("val_fraction must be in [0, 1), got {}", self.val_fraction);
        }
        if self.embed_dim == 0 {
            bail!("embed_dim must be at least 1");
        }
        Ok(())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
// Owns the config and runs the full training pipeline.
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainReport> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Load the labelled messages ────────────────────────────────
        let loader  = CsvDatasetLoader::new(&cfg.data_path);
        let samples = loader
            .load_all()
            .with_context(|| format!("Failed to load dataset '{}'", cfg.data_path))?;
        if samples.is_empty() {
            bail!("Dataset '{}' has no rows", cfg.data_path);
        }

        // ── Step 2: Tokenise and build the shared vocabulary ──────────────────
        let tokenizer = WordTokenizer::new(cfg.lowercase);
        let texts: Vec<&str> = samples.iter().map(|s| s.text.as_str()).collect();
        let labels: Vec<Label> = samples.iter().map(|s| s.label).collect();
        let corpus = tokenizer.tokenize_corpus(&texts)?;
        tracing::info!(
            "Vocabulary: {} entries, longest message {} tokens",
            corpus.vocab.len(),
            corpus.max_len
        );

        // ── Step 3: Encode every message to one fixed width ───────────────────
        let widest_filter = cfg.filter_sizes.iter().copied().max().unwrap_or(1);
        let max_len = cfg.max_len.unwrap_or(corpus.max_len);
        if max_len < widest_filter {
            tracing::warn!(
                "Sequence width {} is below the widest filter ({}); padding to {}",
                max_len,
                widest_filter,
                widest_filter
            );
        }
        let max_len = max_len.max(widest_filter);

        let encoder = Encoder::new(&corpus.vocab, max_len, cfg.overflow);
        let matrix  = encoder.encode_all(&corpus.sequences)?;
        matrix.validate(corpus.vocab.len())?;
        let dataset = ClassificationDataset::from_encoded(&matrix, &labels)?;

        // ── Step 4: Train / validation split ──────────────────────────────────
        let (train_items, val_items) =
            split_train_val(dataset.into_items(), 1.0 - cfg.val_fraction, cfg.seed);
        if train_items.is_empty() {
            bail!("No training examples left after holding out {:.0}% for validation",
                cfg.val_fraction * 100.0);
        }
        let train_dataset = ClassificationDataset::new(train_items);
        let val_dataset   = (!val_items.is_empty()).then(|| ClassificationDataset::new(val_items));

        // ── Step 5: Embedding table (pretrained or random) ────────────────────
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let table = match &cfg.pretrained_vectors {
            Some(path) => {
                let (table, _stats) = EmbeddingTable::from_pretrained_file(&corpus.vocab, path, &mut rng)
                    .with_context(|| format!("Failed to load pretrained vectors '{path}'"))?;
                if table.dim() != cfg.embed_dim {
                    tracing::warn!(
                        "Pretrained vectors have dimension {}; using it instead of embed_dim {}",
                        table.dim(),
                        cfg.embed_dim
                    );
                }
                table
            }
            None => EmbeddingTable::random(corpus.vocab.len(), cfg.embed_dim, &mut rng),
        };

        let model_cfg = CnnClassifierConfig::new(corpus.vocab.len(), table.dim())
            .with_filter_sizes(cfg.filter_sizes.clone())
            .with_num_filters(cfg.num_filters.clone())
            .with_dropout(cfg.dropout)
            .with_freeze_embedding(cfg.freeze_embedding);
        model_cfg.validate()?;

        // ── Step 6: Save what the predictor needs ─────────────────────────────
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt.save_config(&CheckpointConfig {
            train:   cfg.clone(),
            model:   model_cfg.clone(),
            max_len,
        })?;
        ckpt.save_vocab(&corpus.vocab)?;

        // ── Step 7: Train, saving the best model as we go ─────────────────────
        let mut metrics  = MetricsLogger::new(&cfg.checkpoint_dir)?;
        let mut best_acc = None::<f64>;
        let device = Default::default();

        let (_model, report) = run_training::<TrainBackend, _>(
            cfg,
            &model_cfg,
            &table,
            train_dataset,
            val_dataset,
            &device,
            |model, m| {
                metrics.log(m)?;
                // Without validation every epoch replaces the last
                if m.val_acc.is_none() || m.is_improvement(best_acc) {
                    best_acc = m.val_acc.or(best_acc);
                    ckpt.save_model(&model.valid())?;
                    tracing::info!("Saved model from epoch {}", m.epoch);
                }
                Ok(())
            },
        )?;

        tracing::info!(
            "Checkpoint written to '{}', metrics in '{}'",
            ckpt.dir().display(),
            metrics.csv_path().display()
        );
        Ok(report)
    }
}
