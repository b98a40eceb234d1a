// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train` — fits the line classifier on labeled CSV files
//   2. `clean` — scores PDF lines and splits them into
//                cleaned / removed text files
//
// Every flag defaults to the fixed pipeline constant, so a bare
// `pdf-line-cleaner train` or `pdf-line-cleaner clean` runs the
// standard configuration.

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{CleanArgs, Commands, TrainArgs};

/// Top-level CLI definition
#[derive(Parser, Debug)]
#[command(
    name = "pdf-line-cleaner",
    version = "0.1.0",
    about = "Train a content/noise line classifier, then strip noise lines from PDFs."
)]
pub struct Cli {
    /// The subcommand to run (train or clean)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route the subcommand to its use case. The CLI layer never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::Clean(args) => run_clean(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Training on labeled CSV files in: {}", args.data_dir);

    let use_case = TrainUseCase::new(args.into());
    let outcome  = use_case.execute()?;

    println!("Final Accuracy: {:.2}%", outcome.final_accuracy * 100.0);
    if let Some(best) = outcome.best_epoch.checked_sub(1).and_then(|i| outcome.history.get(i)) {
        println!("Best epoch: {} (val_loss={:.4})", best.epoch, best.val_loss);
    }
    println!(
        "Model + vocabulary saved to '{}' and exported to '{}'",
        outcome.primary_dir.display(),
        outcome.export_dir.display(),
    );
    Ok(())
}

fn run_clean(args: CleanArgs) -> Result<()> {
    use crate::application::clean_use_case::CleanUseCase;

    // The scoring context (vocabulary + quantized model) is loaded once here
    // and reused for every document of the run.
    let use_case = CleanUseCase::new(args.into())?;
    let report   = use_case.execute()?;

    println!(
        "Done. Documents: {} (skipped {}), lines: {}, cleaned: {}, removed: {}, failed: {}",
        report.documents,
        report.skipped_documents,
        report.total_lines,
        report.cleaned,
        report.removed,
        report.failed_lines,
    );
    Ok(())
}
