// ============================================================
// Layer 5 — CNN Text Classifier (Kim, 2014)
// ============================================================
//
//   ids [B, L]
//     │ Embedding                     (pad positions masked to 0)
//     ▼
//   [B, L, D] ──swap──▶ [B, D, L]
//     │
//     ├─ Conv1d(D→n₁, k=w₁) + ReLU ─▶ [B, n₁, L-w₁+1] ─ max over time ─▶ [B, n₁]
//     ├─ Conv1d(D→n₂, k=w₂) + ReLU ─▶ [B, n₂, L-w₂+1] ─ max over time ─▶ [B, n₂]
//     └─ ...
//     │ concat
//     ▼
//   [B, Σnᵢ] ─ Dropout ─ Linear ─▶ logits [B, num_classes]
//
// Dropout is only active on an autodiff backend, so the same
// forward serves training and (via model.valid()) evaluation.

use burn::{
    module::Param,
    nn::{
        conv::{Conv1d, Conv1dConfig},
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::relu,
};
use rand::thread_rng;

use crate::data::embeddings::EmbeddingTable;
use crate::data::vocabulary::PAD_ID;
use crate::error::{self, ClassifierError};

// #[derive(Config)] already generates Clone and Serialize/Deserialize;
// adding them again gives conflicting impls.
#[derive(Config, Debug)]
pub struct CnnClassifierConfig {
    pub vocab_size: usize,
    pub embed_dim:  usize,
    /// Width (in tokens) of each filter bank
    #[config(default = "vec![3, 4, 5]")]
    pub filter_sizes: Vec<usize>,
    /// Number of filters in each bank, parallel to `filter_sizes`
    #[config(default = "vec![100, 100, 100]")]
    pub num_filters: Vec<usize>,
    #[config(default = 2)]
    pub num_classes: usize,
    #[config(default = 0.5)]
    pub dropout: f64,
    /// Keep the embedding table fixed during training
    #[config(default = false)]
    pub freeze_embedding: bool,
}

impl CnnClassifierConfig {
    /// Reject hyperparameters the model cannot be built from.
    pub fn validate(&self) -> error::Result<()> {
        let invalid = |msg: String| Err(ClassifierError::InvalidConfig(msg));

        if self.filter_sizes.is_empty() {
            return invalid("at least one filter width is required".into());
        }
        if self.filter_sizes.len() != self.num_filters.len() {
            return invalid(format!(
                "{} filter widths but {} filter counts",
                self.filter_sizes.len(),
                self.num_filters.len()
            ));
        }
        if self.filter_sizes.contains(&0) || self.num_filters.contains(&0) {
            return invalid("filter widths and counts must be positive".into());
        }
        if self.embed_dim == 0 {
            return invalid("embedding dimension must be positive".into());
        }
        if self.vocab_size < 2 {
            return invalid("vocabulary must hold at least the pad and unknown entries".into());
        }
        if self.num_classes < 2 {
            return invalid("at least two classes are required".into());
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return invalid(format!("dropout must be in [0, 1), got {}", self.dropout));
        }
        Ok(())
    }

    /// Length of the pooled feature vector (sum of filter counts).
    pub fn num_features(&self) -> usize {
        self.num_filters.iter().sum()
    }

    /// Widest filter; inputs must be at least this long.
    pub fn max_filter_width(&self) -> usize {
        self.filter_sizes.iter().copied().max().unwrap_or(0)
    }

    /// Build the model with a fresh random embedding table.
    /// Used when the weights are about to be replaced from a checkpoint.
    pub fn init<B: Backend>(&self, device: &B::Device) -> error::Result<CnnClassifier<B>> {
        let table = EmbeddingTable::random(self.vocab_size, self.embed_dim, &mut thread_rng());
        self.init_with_embeddings(&table, device)
    }

    /// Build the model, copying its embedding weights from `table`.
    pub fn init_with_embeddings<B: Backend>(
        &self,
        table:  &EmbeddingTable,
        device: &B::Device,
    ) -> error::Result<CnnClassifier<B>> {
        self.validate()?;
        if table.vocab_size() != self.vocab_size || table.dim() != self.embed_dim {
            return Err(ClassifierError::InvalidConfig(format!(
                "embedding table is {}x{} but the model expects {}x{}",
                table.vocab_size(),
                table.dim(),
                self.vocab_size,
                self.embed_dim
            )));
        }

        let weight = Tensor::<B, 2>::from_data(
            TensorData::new(table.values().to_vec(), [self.vocab_size, self.embed_dim]),
            device,
        );
        let mut embedding = EmbeddingConfig::new(self.vocab_size, self.embed_dim).init(device);
        embedding.weight  = Param::from_tensor(weight);
        let embedding     = if self.freeze_embedding { embedding.no_grad() } else { embedding };

        let convs = self
            .filter_sizes
            .iter()
            .zip(&self.num_filters)
            .map(|(&width, &count)| Conv1dConfig::new(self.embed_dim, count, width).init(device))
            .collect();

        let fc      = LinearConfig::new(self.num_features(), self.num_classes).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();

        Ok(CnnClassifier {
            embedding,
            convs,
            fc,
            dropout,
            max_filter_width: self.max_filter_width(),
        })
    }
}

#[derive(Module, Debug)]
pub struct CnnClassifier<B: Backend> {
    pub embedding:        Embedding<B>,
    /// One filter bank per configured width
    pub convs:            Vec<Conv1d<B>>,
    pub fc:               Linear<B>,
    pub dropout:          Dropout,
    pub max_filter_width: usize,
}

/// Loss plus what it was computed from.
pub struct ClassificationOutput<B: Backend> {
    pub loss:    Tensor<B, 1>,
    pub logits:  Tensor<B, 2>,
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> CnnClassifier<B> {
    /// tokens: [batch, seq_len] → logits: [batch, num_classes]
    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> error::Result<Tensor<B, 2>> {
        let features = self.pooled_features(tokens)?;
        Ok(self.fc.forward(self.dropout.forward(features)))
    }

    /// Per-bank ReLU feature maps before pooling:
    /// one [batch, filters, seq_len - width + 1] tensor per width.
    pub fn conv_feature_maps(&self, tokens: Tensor<B, 2, Int>) -> error::Result<Vec<Tensor<B, 3>>> {
        let [batch_size, seq_len] = tokens.dims();
        if seq_len < self.max_filter_width {
            return Err(ClassifierError::Shape(format!(
                "sequence length {seq_len} is shorter than the widest filter ({})",
                self.max_filter_width
            )));
        }

        // Zero the vectors at pad positions so the pad row never receives a gradient
        let keep = tokens
            .clone()
            .not_equal_elem(PAD_ID as i32)
            .float()
            .unsqueeze_dim::<3>(2);

        let embedded = self.embedding.forward(tokens); // [batch, seq_len, dim]
        let [_, _, dim] = embedded.dims();
        let embedded = embedded * keep.expand([batch_size, seq_len, dim]);

        // Conv1d wants channels first: [batch, dim, seq_len]
        let x = embedded.swap_dims(1, 2);

        Ok(self.convs.iter().map(|conv| relu(conv.forward(x.clone()))).collect())
    }

    /// Max-over-time pooled features: [batch, Σ filters].
    pub fn pooled_features(&self, tokens: Tensor<B, 2, Int>) -> error::Result<Tensor<B, 2>> {
        let pooled = self
            .conv_feature_maps(tokens)?
            .into_iter()
            .map(|map| map.max_dim(2).flatten::<2>(1, 2))
            .collect();
        Ok(Tensor::cat(pooled, 1))
    }

    /// Forward pass plus cross-entropy against integer class labels.
    pub fn forward_classification(
        &self,
        tokens: Tensor<B, 2, Int>,
        labels: Tensor<B, 1, Int>,
    ) -> error::Result<ClassificationOutput<B>> {
        let [rows, _] = tokens.dims();
        let [n_labels] = labels.dims();
        if rows != n_labels {
            return Err(ClassifierError::Shape(format!(
                "batch has {rows} sequences but {n_labels} labels"
            )));
        }

        let logits = self.forward(tokens)?;
        let loss   = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), labels.clone());

        Ok(ClassificationOutput { loss, logits, targets: labels })
    }
}
