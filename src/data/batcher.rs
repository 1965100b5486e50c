// ============================================================
// Layer 4 — Classification Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec of
// ClassificationItems into tensors for the classifier.
//
// How batching works here:
//   Input:  N items, each with an id row of length L
//   Output: ClassificationBatch with
//             tokens [N, L]  (Int)
//             labels [N]     (Int)
//
//   All rows are already padded to the same width by the
//   Encoder, so the ids are flattened into one buffer and
//   reshaped: [r1_t1, ..., r1_tL, r2_t1, ..., rN_tL] → [N, L]
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::ClassificationItem;

/// A batch of encoded messages ready for the forward pass.
#[derive(Debug, Clone)]
pub struct ClassificationBatch<B: Backend> {
    /// Padded id rows, shape [batch_size, seq_len]
    pub tokens: Tensor<B, 2, Int>,

    /// Class ids (0 = not spam, 1 = spam), shape [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

/// Stateless batcher; the data loader passes the target device.
#[derive(Clone, Debug, Default)]
pub struct ClassificationBatcher;

impl<B: Backend> Batcher<B, ClassificationItem, ClassificationBatch<B>> for ClassificationBatcher {
    fn batch(&self, items: Vec<ClassificationItem>, device: &B::Device) -> ClassificationBatch<B> {
        let batch_size = items.len();
        let seq_len    = items.first().map(|item| item.ids.len()).unwrap_or(0);

        let flat: Vec<u32> = items.iter().flat_map(|item| item.ids.iter().copied()).collect();
        let tokens = ids_to_tensor::<B>(&flat, batch_size, seq_len, device);

        let labels: Vec<i32> = items.iter().map(|item| item.label as i32).collect();
        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), device);

        ClassificationBatch { tokens, labels }
    }
}

/// Build a `[rows, width]` Int tensor from a row-major id buffer.
/// Shared by the batcher and the predictor.
pub fn ids_to_tensor<B: Backend>(
    ids:    &[u32],
    rows:   usize,
    width:  usize,
    device: &B::Device,
) -> Tensor<B, 2, Int> {
    // Burn's Int tensors are built from signed integers
    let flat: Vec<i32> = ids.iter().map(|&id| id as i32).collect();
    Tensor::<B, 1, Int>::from_ints(flat.as_slice(), device).reshape([rows, width])
}
