// ============================================================
// Layer 5 — Predictor
// ============================================================
// Applies a trained classifier to new raw text.
//
//   raw text
//     → WordTokenizer      (lowercase per PredictConfig)
//     → Encoder            (fixed max_len from the checkpoint,
//                           truncate, unknown → <unk>)
//     → CnnClassifier      (eval backend, no dropout)
//     → softmax over the class logits
//
// The max length is the one the model was trained with, never
// recomputed from the input, so a short text is padded and a
// long one truncated.

use burn::{prelude::*, tensor::activation::softmax};

use crate::data::{
    batcher::ids_to_tensor,
    encoder::{Encoder, OverflowPolicy},
    tokenizer::WordTokenizer,
    vocabulary::Vocabulary,
};
use crate::domain::{sample::Label, traits::TextClassifier};
use crate::error::{ClassifierError, Result};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::CnnClassifier;

/// Result of classifying one text.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Softmax over the classes, indexed by [`Label::id`]
    pub probabilities:    Vec<f32>,
    pub spam_probability: f32,
    /// Spam iff `spam_probability > 0.5`
    pub label:            Label,
}

pub struct Predictor<B: Backend> {
    model:     CnnClassifier<B>,
    vocab:     Vocabulary,
    tokenizer: WordTokenizer,
    max_len:   usize,
    device:    B::Device,
}

impl<B: Backend> Predictor<B> {
    pub fn new(
        model:     CnnClassifier<B>,
        vocab:     Vocabulary,
        tokenizer: WordTokenizer,
        max_len:   usize,
        device:    B::Device,
    ) -> Self {
        Self { model, vocab, tokenizer, max_len, device }
    }

    /// Rebuild the trained model, vocabulary and max length from a
    /// checkpoint directory.
    pub fn from_checkpoint(
        ckpt:      &CheckpointManager,
        tokenizer: WordTokenizer,
        device:    B::Device,
    ) -> Result<Self> {
        let cfg   = ckpt.load_config()?;
        let vocab = ckpt.load_vocab()?;

        if cfg.model.vocab_size != vocab.len() {
            return Err(ClassifierError::Checkpoint(format!(
                "model expects {} vocabulary entries but vocab.json has {}",
                cfg.model.vocab_size,
                vocab.len()
            )));
        }

        let model = cfg.model.init::<B>(&device)?;
        let model = ckpt.load_model(model, &device)?;
        tracing::info!(
            "Model loaded from '{}' ({} vocabulary entries, max length {})",
            ckpt.dir().display(),
            vocab.len(),
            cfg.max_len
        );

        Ok(Self::new(model, vocab, tokenizer, cfg.max_len, device))
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Encode `text` into exactly `max_len` ids.
    pub fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let tokens = self.tokenizer.tokenize(text)?;
        if tokens.len() > self.max_len {
            tracing::debug!("Input has {} tokens; keeping the first {}", tokens.len(), self.max_len);
        }

        let ids = Encoder::new(&self.vocab, self.max_len, OverflowPolicy::Truncate).encode(&tokens)?;
        if let Some(&bad) = ids.iter().find(|&&id| id as usize >= self.vocab.len()) {
            return Err(ClassifierError::Vocabulary { id: bad, vocab_size: self.vocab.len() });
        }
        Ok(ids)
    }

    /// Class probabilities for `text`, indexed by [`Label::id`].
    pub fn predict_proba(&self, text: &str) -> Result<Vec<f32>> {
        let ids    = self.encode(text)?;
        let tokens = ids_to_tensor::<B>(&ids, 1, self.max_len, &self.device);

        let logits = self.model.forward(tokens)?;
        softmax(logits, 1)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| ClassifierError::Shape(format!("cannot read probabilities: {e:?}")))
    }

    pub fn predict(&self, text: &str) -> Result<Prediction> {
        let probabilities    = self.predict_proba(text)?;
        let spam_probability = probabilities
            .get(Label::Spam.id())
            .copied()
            .ok_or_else(|| ClassifierError::Shape(format!(
                "expected at least {} class probabilities, got {}",
                Label::COUNT,
                probabilities.len()
            )))?;

        let label = Label::from_probability(spam_probability);
        tracing::debug!("p(spam) = {:.4} → {}", spam_probability, label);

        Ok(Prediction { probabilities, spam_probability, label })
    }
}

impl<B: Backend> TextClassifier for Predictor<B> {
    fn spam_probability(&self, text: &str) -> Result<f32> {
        Ok(self.predict(text)?.spam_probability)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use burn::backend::NdArray;

    use super::*;
    use crate::ml::model::CnnClassifierConfig;

    type TestBackend = NdArray;

    fn predictor(max_len: usize) -> Predictor<TestBackend> {
        let device = Default::default();
        let vocab  = Vocabulary::build(&[vec!["win", "free", "money"], vec!["see", "you", "soon"]]);
        let model  = CnnClassifierConfig::new(vocab.len(), 5)
            .with_filter_sizes(vec![2, 3])
            .with_num_filters(vec![2, 2])
            .init::<TestBackend>(&device)
            .unwrap();
        Predictor::new(model, vocab, WordTokenizer::new(true), max_len, device)
    }

    #[test]
    fn test_encode_uses_fixed_length() {
        let p = predictor(6);
        assert_eq!(p.encode("win").unwrap(), vec![2, 0, 0, 0, 0, 0]);
        assert_eq!(p.encode("see you soon win free money now").unwrap().len(), 6);
    }

    #[test]
    fn test_unknown_and_cased_tokens() {
        let p = predictor(4);
        // lowercased before lookup; "Lottery" is unseen
        assert_eq!(p.encode("FREE Lottery").unwrap(), vec![3, 1, 0, 0]);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let p     = predictor(6);
        let probs = p.predict_proba("win free money").unwrap();
        assert_eq!(probs.len(), 2);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!(probs.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_prediction_is_consistent() {
        let p    = predictor(6);
        let pred = p.predict("see you soon").unwrap();
        assert_eq!(pred.spam_probability, pred.probabilities[1]);
        assert_eq!(pred.label, Label::from_probability(pred.spam_probability));
        assert_eq!(p.classify("see you soon").unwrap(), pred.label);
        assert_eq!(p.spam_probability("see you soon").unwrap(), pred.spam_probability);
    }

    #[test]
    fn test_empty_text_is_all_padding() {
        let p = predictor(5);
        assert_eq!(p.encode("").unwrap(), vec![0; 5]);
        assert!(p.predict("").is_ok());
    }
}
