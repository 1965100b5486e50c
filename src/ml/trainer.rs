// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Train + validation loop using Burn's DataLoader and Adam.
//
// Two modes:
//   - training:   model on the autodiff backend, dropout active,
//                 one Adam step per shuffled mini-batch
//   - evaluation: model.valid() on the inner backend, dropout
//                 off, no gradients
//
// A single seed drives the backend RNG (weight init, dropout
// masks) and the loader's shuffle order, so a run is
// reproducible end to end.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::sync::Arc;
use std::time::Instant;

use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::batcher::{ClassificationBatch, ClassificationBatcher};
use crate::data::dataset::ClassificationDataset;
use crate::data::embeddings::EmbeddingTable;
use crate::error::Result;
use crate::infra::metrics::EpochMetrics;
use crate::ml::model::{CnnClassifier, CnnClassifierConfig};

/// Summary of a finished training run.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub epochs: Vec<EpochMetrics>,
    /// Best validation accuracy (percent) over all epochs, if validated
    pub best_accuracy: Option<f64>,
}

/// Loss and accuracy over a whole evaluation set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// Mean of the per-batch cross-entropy losses
    pub loss: f64,
    /// Percentage of examples whose argmax matches the label
    pub accuracy: f64,
    pub correct: usize,
    pub total:   usize,
}

/// Seed the backend, build the classifier from `model_cfg` and
/// `table`, and train it.
pub fn run_training<B, F>(
    cfg:           &TrainConfig,
    model_cfg:     &CnnClassifierConfig,
    table:         &EmbeddingTable,
    train_dataset: ClassificationDataset,
    val_dataset:   Option<ClassificationDataset>,
    device:        &B::Device,
    on_epoch:      F,
) -> Result<(CnnClassifier<B>, TrainReport)>
where
    B: AutodiffBackend,
    F: FnMut(&CnnClassifier<B>, &EpochMetrics) -> Result<()>,
{
    // Weight init and dropout masks draw from the backend RNG
    B::seed(device, cfg.seed);

    let model = model_cfg.init_with_embeddings::<B>(table, device)?;
    tracing::info!(
        "Training on {} examples ({} validation), {} epochs, batch size {}",
        train_dataset.sample_count(),
        val_dataset.as_ref().map_or(0, ClassificationDataset::sample_count),
        cfg.epochs,
        cfg.batch_size
    );

    train_loop(cfg, model, train_dataset, val_dataset, on_epoch)
}

/// Train `model` on `train_dataset`, validating on `val_dataset`
/// after every epoch when one is given.
///
/// `on_epoch` runs after each epoch with the current model and its
/// metrics; the use case saves checkpoints and metrics rows there.
pub fn train_loop<B, F>(
    cfg:           &TrainConfig,
    mut model:     CnnClassifier<B>,
    train_dataset: ClassificationDataset,
    val_dataset:   Option<ClassificationDataset>,
    mut on_epoch:  F,
) -> Result<(CnnClassifier<B>, TrainReport)>
where
    B: AutodiffBackend,
    F: FnMut(&CnnClassifier<B>, &EpochMetrics) -> Result<()>,
{
    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let optim_cfg = AdamConfig::new().with_epsilon(1e-8);
    let mut optim = optim_cfg.init();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_loader: Arc<dyn DataLoader<B, ClassificationBatch<B>>> =
        DataLoaderBuilder::new(ClassificationBatcher)
            .batch_size(cfg.batch_size)
            .shuffle(cfg.seed)
            .num_workers(1)
            .build(train_dataset);

    // ── Validation data loader (InnerBackend, no autodiff) ────────────────────
    let val_loader: Option<Arc<dyn DataLoader<B::InnerBackend, ClassificationBatch<B::InnerBackend>>>> =
        val_dataset.map(|dataset| {
            DataLoaderBuilder::new(ClassificationBatcher)
                .batch_size(cfg.batch_size)
                .num_workers(1)
                .build(dataset)
        });

    print_table_header();

    let mut history       = Vec::with_capacity(cfg.epochs);
    let mut best_accuracy = None::<f64>;

    for epoch in 1..=cfg.epochs {
        let started = Instant::now();

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let output = model.forward_classification(batch.tokens, batch.labels)?;

            train_loss_sum += output.loss.clone().into_scalar().elem::<f64>();
            train_batches  += 1;

            // Gradients are fresh per backward pass; nothing accumulates across batches
            let grads = output.loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        let evaluation = match &val_loader {
            Some(loader) => Some(evaluate(&model.valid(), loader.as_ref())?),
            None => None,
        };

        if let Some(eval) = evaluation {
            best_accuracy = Some(best_accuracy.map_or(eval.accuracy, |best| best.max(eval.accuracy)));
        }

        let metrics = EpochMetrics::new(
            epoch,
            train_loss,
            evaluation.map(|e| e.loss),
            evaluation.map(|e| e.accuracy),
            started.elapsed().as_secs_f64(),
        );
        print_table_row(&metrics);
        tracing::debug!("Epoch {} finished: {:?}", epoch, metrics);

        on_epoch(&model, &metrics)?;
        history.push(metrics);
    }

    match best_accuracy {
        Some(best) => println!("\nTraining complete! Best accuracy: {best:.2}%."),
        None => println!("\nTraining complete!"),
    }
    tracing::info!("Training complete after {} epochs", cfg.epochs);

    Ok((model, TrainReport { epochs: history, best_accuracy }))
}

/// Run `model` over every batch of `loader` without updating it.
pub fn evaluate<B: Backend>(
    model:  &CnnClassifier<B>,
    loader: &dyn DataLoader<B, ClassificationBatch<B>>,
) -> Result<Evaluation> {
    let mut loss_sum = 0.0f64;
    let mut batches  = 0usize;
    let mut correct  = 0usize;
    let mut total    = 0usize;

    for batch in loader.iter() {
        let output = model.forward_classification(batch.tokens, batch.labels)?;

        loss_sum += output.loss.into_scalar().elem::<f64>();
        batches  += 1;
        total    += output.targets.dims()[0];
        correct  += count_correct(output.logits, output.targets);
    }

    Ok(Evaluation {
        loss:     if batches > 0 { loss_sum / batches as f64 } else { f64::NAN },
        accuracy: accuracy_percent(correct, total),
        correct,
        total,
    })
}

/// Number of rows whose highest logit is at the label's index.
pub fn count_correct<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> usize {
    // argmax(1) returns [batch, 1]; flatten to [batch]
    // before comparing with labels which is [batch]
    let predicted = logits.argmax(1).flatten::<1>(0, 1);
    predicted.equal(labels).int().sum().into_scalar().elem::<i64>() as usize
}

/// `correct / total` as a percentage; 0 for an empty set.
pub fn accuracy_percent(correct: usize, total: usize) -> f64 {
    if total == 0 { 0.0 } else { correct as f64 / total as f64 * 100.0 }
}

fn print_table_header() {
    println!(
        "{:^7} | {:^12} | {:^10} | {:^9} | {:^9}",
        "Epoch", "Train Loss", "Val Loss", "Val Acc", "Elapsed"
    );
    println!("{}", "-".repeat(60));
}

fn print_table_row(m: &EpochMetrics) {
    let val_loss = m.val_loss.map_or_else(|| "-".to_string(), |v| format!("{v:.6}"));
    let val_acc  = m.val_acc.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
    println!(
        "{:^7} | {:^12.6} | {:^10} | {:^9} | {:^9.2}",
        m.epoch, m.train_loss, val_loss, val_acc, m.elapsed_secs
    );
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use burn::backend::{Autodiff, NdArray};
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::data::dataset::ClassificationItem;

    type TestBackend     = NdArray;
    type TestAutodiff    = Autodiff<NdArray>;

    fn items() -> Vec<ClassificationItem> {
        // spam rows use ids 2..=4, ham rows use ids 5..=7
        (0..12)
            .map(|i| {
                let label = i % 2;
                let base  = if label == 1 { 2 } else { 5 };
                ClassificationItem {
                    ids: vec![base, base + 1, base + 2, base, 0, 0],
                    label,
                }
            })
            .collect()
    }

    fn model_config(freeze: bool) -> CnnClassifierConfig {
        CnnClassifierConfig::new(8, 6)
            .with_filter_sizes(vec![2, 3])
            .with_num_filters(vec![3, 3])
            .with_freeze_embedding(freeze)
    }

    fn train_config(epochs: usize) -> TrainConfig {
        TrainConfig { epochs, batch_size: 4, lr: 1e-2, ..TrainConfig::default() }
    }

    fn table() -> EmbeddingTable {
        EmbeddingTable::random(8, 6, &mut StdRng::seed_from_u64(42))
    }

    fn embedding_weights<B: Backend>(model: &CnnClassifier<B>) -> Vec<f32> {
        model.embedding.weight.val().into_data().convert::<f32>().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_count_correct_and_accuracy() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 2>::from_floats(
            [[0.9, 0.1], [0.2, 0.8], [0.7, 0.3], [0.4, 0.6]],
            &device,
        );
        let labels = Tensor::<TestBackend, 1, Int>::from_ints([0, 1, 1, 1].as_slice(), &device);
        let correct = count_correct(logits, labels);
        assert_eq!(correct, 3);
        assert_eq!(accuracy_percent(correct, 4), 75.0);
        assert_eq!(accuracy_percent(0, 0), 0.0);
    }

    #[test]
    fn test_training_reports_every_epoch_and_best_accuracy() {
        let device = Default::default();
        let model  = model_config(false)
            .init_with_embeddings::<TestAutodiff>(&table(), &device)
            .unwrap();

        let mut seen = Vec::new();
        let (_, report) = train_loop(
            &train_config(3),
            model,
            ClassificationDataset::new(items()),
            Some(ClassificationDataset::new(items())),
            |_, m| {
                seen.push(m.epoch);
                Ok(())
            },
        )
        .unwrap();

        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(report.epochs.len(), 3);
        assert!(report.epochs.iter().all(|m| m.train_loss.is_finite()));

        let best = report.best_accuracy.unwrap();
        let max_epoch_acc = report
            .epochs
            .iter()
            .filter_map(|m| m.val_acc)
            .fold(f64::MIN, f64::max);
        assert_eq!(best, max_epoch_acc);
        assert!((0.0..=100.0).contains(&best));
    }

    #[test]
    fn test_without_validation_there_is_no_accuracy() {
        let device = Default::default();
        let model  = model_config(false)
            .init_with_embeddings::<TestAutodiff>(&table(), &device)
            .unwrap();

        let (_, report) = train_loop(
            &train_config(1),
            model,
            ClassificationDataset::new(items()),
            None,
            |_, _| Ok(()),
        )
        .unwrap();

        assert!(report.best_accuracy.is_none());
        assert!(report.epochs[0].val_loss.is_none());
    }

    #[test]
    fn test_fine_tuning_moves_embeddings_but_not_the_pad_row() {
        let device = Default::default();
        let model  = model_config(false)
            .init_with_embeddings::<TestAutodiff>(&table(), &device)
            .unwrap();
        let before = embedding_weights(&model);

        let (model, _) = train_loop(
            &train_config(2),
            model,
            ClassificationDataset::new(items()),
            None,
            |_, _| Ok(()),
        )
        .unwrap();
        let after = embedding_weights(&model);

        assert!(after[..6].iter().all(|&v| v == 0.0));
        assert_ne!(before[6..], after[6..]);
    }

    #[test]
    fn test_frozen_embeddings_do_not_change() {
        let device = Default::default();
        let model  = model_config(true)
            .init_with_embeddings::<TestAutodiff>(&table(), &device)
            .unwrap();
        let before = embedding_weights(&model);

        let (model, _) = train_loop(
            &train_config(2),
            model,
            ClassificationDataset::new(items()),
            None,
            |_, _| Ok(()),
        )
        .unwrap();

        assert_eq!(embedding_weights(&model), before);
    }

    #[test]
    fn test_evaluation_counts_every_example() {
        let device = Default::default();
        let model  = model_config(false)
            .init_with_embeddings::<TestBackend>(&table(), &device)
            .unwrap();

        let loader: Arc<dyn DataLoader<TestBackend, ClassificationBatch<TestBackend>>> =
            DataLoaderBuilder::new(ClassificationBatcher)
                .batch_size(5)
                .build(ClassificationDataset::new(items()));

        let eval = evaluate(&model, loader.as_ref()).unwrap();
        assert_eq!(eval.total, 12);
        assert_eq!(eval.accuracy, accuracy_percent(eval.correct, 12));
        assert!(eval.loss.is_finite());
    }
}
