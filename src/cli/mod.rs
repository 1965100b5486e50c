// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with clap.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`   — trains the classifier on a labelled CSV
//   2. `predict` — loads a checkpoint and classifies a message
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "textcnn-spam",
    version,
    about = "Train a convolutional spam classifier, then classify messages."
)]
pub struct Cli {
    /// The subcommand to run (train or predict)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on '{}'", args.data);

    let report = TrainUseCase::new(args.into()).execute()?;
    if let Some(last) = report.epochs.last() {
        tracing::info!("Final train loss {:.4}", last.train_loss);
    }
    println!("Checkpoint saved.");
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let text       = args.text.clone();
    let use_case   = PredictUseCase::new(&args.into())?;
    let prediction = use_case.predict(&text)?;

    println!("Label:            {}", prediction.label);
    println!("Spam probability: {:.4}", prediction.spam_probability);
    Ok(())
}
