// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Loads a trained checkpoint once, then classifies raw texts.
//
// Casing: training keeps case by default while prediction
// lowercases by default. Both are configurable; when they
// differ the mismatch is logged, since tokens the model saw
// capitalised will then map to <unk>.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::tokenizer::WordTokenizer;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    inferencer::{Prediction, Predictor},
    InferBackend,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictConfig {
    /// Directory written by the `train` command
    pub checkpoint_dir: String,
    /// Lowercase input text before tokenising
    pub lowercase:      bool,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: "checkpoints".to_string(),
            lowercase:      true,
        }
    }
}

pub struct PredictUseCase {
    predictor: Predictor<InferBackend>,
}

impl PredictUseCase {
    pub fn new(config: &PredictConfig) -> Result<Self> {
        let ckpt = CheckpointManager::open(&config.checkpoint_dir)?;

        let trained = ckpt.load_config().context("Have you run 'train' first?")?;
        if trained.train.lowercase != config.lowercase {
            tracing::warn!(
                "Model was trained with lowercase={} but prediction uses lowercase={}",
                trained.train.lowercase,
                config.lowercase
            );
        }

        let predictor = Predictor::from_checkpoint(
            &ckpt,
            WordTokenizer::new(config.lowercase),
            Default::default(),
        )
        .with_context(|| format!("Cannot load model from '{}'", config.checkpoint_dir))?;

        Ok(Self { predictor })
    }

    pub fn predict(&self, text: &str) -> Result<Prediction> {
        Ok(self.predictor.predict(text)?)
    }
}
