// ============================================================
// Layer 1: CLI / Presentation Layer
// ============================================================
// Parses arguments with clap, hands off to Layer 2 and prints
// whatever comes back. No training or data logic lives here.
//
//   1. `train`    runs the whole pipeline and prints test accuracy
//   2. `evaluate` re-scores a checkpoint on the test split
//   3. `predict`  shows one test image and the model's guess

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, PredictArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "mnist-cnn",
    version = "0.1.0",
    about = "Train a small CNN on MNIST handwritten digits and report test accuracy."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Predict(args)  => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training with MNIST from: {}", args.data_dir);

    let summary = TrainUseCase::new(args.into()).execute()?;

    println!();
    if let Some(last) = &summary.last {
        println!(
            "Final epoch {}: train_acc={:.4}, val_acc={:.4}",
            last.epoch, last.train_acc, last.val_acc
        );
    }
    println!("{}", summary.test_report);
    println!(
        "Trained {} epochs (best validation accuracy {:.4} at epoch {}).",
        summary.epochs_run, summary.best_val_acc, summary.best_epoch
    );
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let use_case = EvaluateUseCase::new(
        args.checkpoint_dir,
        args.data_dir,
        args.batch_size,
        args.limit,
    )?;
    let report = use_case.execute()?;
    println!("{report}");
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::{render_ascii, PredictUseCase};

    let use_case = PredictUseCase::new(args.checkpoint_dir, args.data_dir)?;
    let outcome  = use_case.predict(args.index)?;

    print!("{}", render_ascii(&outcome.pixels));
    println!(
        "Test image #{}: label {}, predicted {} ({:.1}% confidence) {}",
        outcome.index,
        outcome.true_label,
        outcome.prediction.digit,
        outcome.prediction.confidence * 100.0,
        if outcome.is_correct() { "✓" } else { "✗" }
    );
    for (digit, p) in outcome.prediction.probabilities.iter().enumerate() {
        println!("  {digit}: {p:.4}");
    }
    Ok(())
}
