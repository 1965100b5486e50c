// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that builds, trains or runs the network lives here.
//
//   model.rs      — the Kim (2014) CNN
//                   • embedding lookup (pad positions masked)
//                   • one Conv1d + ReLU per filter width
//                   • max-over-time pooling, concatenation
//                   • dropout + linear output layer
//
//   trainer.rs    — the training loop and evaluator
//                   Adam steps on the autodiff backend,
//                   validation on the inner backend
//
//   inferencer.rs — the predictor
//                   rebuilds a model from a checkpoint and
//                   scores raw text
//
// Backends: NdArray on the CPU by default; the `wgpu` cargo
// feature switches both aliases to the GPU.
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Kim (2014) Convolutional Neural Networks for
//            Sentence Classification

use burn::{backend::Autodiff, tensor::backend::AutodiffBackend};

#[cfg(not(feature = "wgpu"))]
type BaseBackend = burn::backend::NdArray;

#[cfg(feature = "wgpu")]
type BaseBackend = burn::backend::Wgpu;

/// Backend the training loop runs on (gradients enabled)
pub type TrainBackend = Autodiff<BaseBackend>;

/// Backend used for validation and prediction
pub type InferBackend = <TrainBackend as AutodiffBackend>::InnerBackend;

/// Kim (2014) CNN text classifier
pub mod model;

/// Training loop with per-epoch validation
pub mod trainer;

/// Predictor: loads a checkpoint and scores raw text
pub mod inferencer;
