// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Persistence concerns shared by the training and prediction
// workflows:
//
//   checkpoint.rs — Saving and loading a trained classifier
//                   Model weights via Burn's CompactRecorder,
//                   plus train_config.json and vocab.json so
//                   prediction can rebuild the same model and
//                   the same token ids.
//
//   metrics.rs    — Training metrics logging
//                   Writes epoch-level loss and accuracy to a
//                   CSV file for later analysis and plotting.
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Model, config and vocabulary persistence
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
