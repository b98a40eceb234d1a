// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `clean`, and their
// flags. Conversions into the application-layer configs live
// here so Layer 2 never sees clap types.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::clean_use_case::CleanConfig;
use crate::application::train_use_case::TrainConfig;
use crate::data::encoder::DEFAULT_MAX_LEN;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the line classifier on every labeled CSV in a directory
    Train(TrainArgs),

    /// Score every line of every PDF in a directory and split the output
    Clean(CleanArgs),
}

/// Arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory holding the labeled `.csv` files (columns: line, label)
    #[arg(long, default_value = "training_data")]
    pub data_dir: String,

    /// Primary artifact directory (model, vocabulary, weights)
    #[arg(long, default_value = "assets")]
    pub assets_dir: String,

    /// Distribution directory that receives a byte-identical copy
    #[arg(long, default_value = "models")]
    pub export_dir: String,

    /// Fixed encoded sequence length
    #[arg(long, default_value_t = DEFAULT_MAX_LEN)]
    pub max_len: usize,

    /// Number of full passes over the training split
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Samples per gradient step
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Seed for the split, shuffling and weight initialisation
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:   a.data_dir,
            assets_dir: a.assets_dir,
            export_dir: a.export_dir,
            max_len:    a.max_len,
            epochs:     a.epochs,
            batch_size: a.batch_size,
            lr:         a.lr,
            seed:       a.seed,
            ..TrainConfig::default()
        }
    }
}

/// Arguments for the `clean` command.
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Directory holding the exported model bundle
    #[arg(long, default_value = "models")]
    pub model_dir: String,

    /// Directory of `.pdf` files to clean
    #[arg(long, default_value = "test_books")]
    pub input_dir: String,

    /// Output file for lines classified as content
    #[arg(long, default_value = "sample_cleaned.txt")]
    pub cleaned: PathBuf,

    /// Output file for lines classified as noise
    #[arg(long, default_value = "sample_removed.txt")]
    pub removed: PathBuf,
}

impl From<CleanArgs> for CleanConfig {
    fn from(a: CleanArgs) -> Self {
        CleanConfig {
            model_dir:    a.model_dir,
            input_dir:    a.input_dir,
            cleaned_path: a.cleaned,
            removed_path: a.removed,
        }
    }
}
