// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores everything the predictor needs to rebuild
// a trained classifier.
//
// What gets saved:
//   1. train_config.json — the TrainConfig of the run, the
//                          CnnClassifierConfig and the fixed
//                          max sequence length
//   2. vocab.json        — the vocabulary, as a JSON array
//   3. model.mpk         — all learned parameters
//
// The model config and max length are needed to rebuild the
// exact architecture before the weights can be loaded into it,
// and the vocabulary is needed to map raw text to the same ids.
//
// Burn's CompactRecorder:
//   - Serialises model parameters to MessagePack format
//   - Stores floats at half precision
//   - Loading fails if the architecture doesn't match
//
// Reference: Burn Book §5 (Records and Checkpointing)

use std::{
    fs,
    path::{Path, PathBuf},
};

use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::data::vocabulary::Vocabulary;
use crate::error::{ClassifierError, Result};
use crate::ml::model::{CnnClassifier, CnnClassifierConfig};

const CONFIG_FILE: &str = "train_config.json";
const VOCAB_FILE:  &str = "vocab.json";
// CompactRecorder appends ".mpk"
const MODEL_FILE:  &str = "model";

/// Contents of `train_config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Hyperparameters the run was started with
    pub train: TrainConfig,
    /// Architecture of the saved model
    pub model: CnnClassifierConfig,
    /// Width every sequence was padded or truncated to
    pub max_len: usize,
}

/// Manages the files of one checkpoint directory.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager.
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| ClassifierError::io(&dir, e))?;
        Ok(Self { dir })
    }

    /// Open an existing checkpoint directory without creating it.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(ClassifierError::Checkpoint(format!(
                "no checkpoint directory at '{}'. Have you run 'train' first?",
                dir.display()
            )));
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save model weights, replacing the previous ones.
    ///
    /// Pass the model for the inner backend (`model.valid()`), which
    /// is what the predictor loads it into.
    pub fn save_model<B: Backend>(&self, model: &CnnClassifier<B>) -> Result<()> {
        let path = self.dir.join(MODEL_FILE);

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .map_err(|e| {
                ClassifierError::Checkpoint(format!(
                    "failed to save model to '{}': {e}",
                    path.display()
                ))
            })?;

        tracing::debug!("Saved model weights to '{}'", path.display());
        Ok(())
    }

    /// Load saved weights into `model`, which must have the saved
    /// architecture.
    pub fn load_model<B: Backend>(
        &self,
        model:  CnnClassifier<B>,
        device: &B::Device,
    ) -> Result<CnnClassifier<B>> {
        let path = self.dir.join(MODEL_FILE);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .map_err(|e| {
                ClassifierError::Checkpoint(format!(
                    "cannot load model from '{}': {e}",
                    path.display()
                ))
            })?;

        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &CheckpointConfig) -> Result<()> {
        self.write_json(CONFIG_FILE, cfg)
    }

    pub fn load_config(&self) -> Result<CheckpointConfig> {
        self.read_json(CONFIG_FILE)
    }

    pub fn save_vocab(&self, vocab: &Vocabulary) -> Result<()> {
        self.write_json(VOCAB_FILE, vocab)
    }

    pub fn load_vocab(&self) -> Result<Vocabulary> {
        self.read_json(VOCAB_FILE)
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| ClassifierError::Checkpoint(format!("cannot serialise {name}: {e}")))?;

        fs::write(&path, json).map_err(|e| ClassifierError::io(&path, e))?;

        tracing::debug!("Saved '{}'", path.display());
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path).map_err(|e| ClassifierError::io(&path, e))?;

        serde_json::from_str(&json).map_err(|e| {
            ClassifierError::Checkpoint(format!("cannot parse '{}': {e}", path.display()))
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use burn::backend::NdArray;

    use super::*;

    type TestBackend = NdArray;

    fn model_config() -> CnnClassifierConfig {
        CnnClassifierConfig::new(6, 4)
            .with_filter_sizes(vec![2])
            .with_num_filters(vec![3])
    }

    #[test]
    fn test_config_and_vocab_round_trip() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();

        let cfg = CheckpointConfig {
            train:   TrainConfig { epochs: 3, ..TrainConfig::default() },
            model:   model_config(),
            max_len: 17,
        };
        ckpt.save_config(&cfg).unwrap();

        let vocab = Vocabulary::build(&[vec!["free", "money"], vec!["hi"]]);
        ckpt.save_vocab(&vocab).unwrap();

        let loaded = ckpt.load_config().unwrap();
        assert_eq!(loaded.max_len, 17);
        assert_eq!(loaded.train.epochs, 3);
        assert_eq!(loaded.model.filter_sizes, vec![2]);
        assert_eq!(ckpt.load_vocab().unwrap(), vocab);
    }

    #[test]
    fn test_model_round_trip_keeps_weights() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path()).unwrap();
        let device = Default::default();

        let model: CnnClassifier<TestBackend> = model_config().init(&device).unwrap();
        ckpt.save_model(&model).unwrap();
        assert!(dir.path().join("model.mpk").exists());

        let fresh: CnnClassifier<TestBackend> = model_config().init(&device).unwrap();
        let loaded = ckpt.load_model(fresh, &device).unwrap();

        let tokens = Tensor::<TestBackend, 2, Int>::from_ints([[2, 3, 4, 5]], &device);
        let expected = model.forward(tokens.clone()).unwrap().into_data().to_vec::<f32>().unwrap();
        let actual   = loaded.forward(tokens).unwrap().into_data().to_vec::<f32>().unwrap();

        // CompactRecorder stores half precision
        for (e, a) in expected.iter().zip(&actual) {
            assert!((e - a).abs() < 5e-2, "expected {e}, got {a}");
        }
    }

    #[test]
    fn test_missing_files_are_reported() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::open(dir.path()).unwrap();

        assert!(matches!(ckpt.load_vocab(), Err(ClassifierError::Io { .. })));
        let device = Default::default();
        let model: CnnClassifier<TestBackend> = model_config().init(&device).unwrap();
        assert!(matches!(
            ckpt.load_model(model, &device),
            Err(ClassifierError::Checkpoint(_))
        ));

        let missing = dir.path().join("nope");
        assert!(matches!(
            CheckpointManager::open(missing),
            Err(ClassifierError::Checkpoint(_))
        ));
    }

    #[test]
    fn test_corrupt_json_is_a_checkpoint_error() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        fs::write(dir.path().join("vocab.json"), "[\"<unk>\", \"<pad>\"]").unwrap();

        assert!(matches!(ckpt.load_vocab(), Err(ClassifierError::Checkpoint(_))));
    }
}
