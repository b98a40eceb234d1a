// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load labeled .csv files   (Layer 4 - data)
//   Step 2: Update the vocabulary     (Layer 6 - infra, Layer 4 - data)
//   Step 3: Encode every line         (Layer 4 - data)
//   Step 4: Stratified split          (Layer 4 - data)
//   Step 5: Build datasets            (Layer 4 - data)
//   Step 6: Run training loop         (Layer 5 - ml)
//   Step 7: Export the bundle         (Layer 6 - infra)
//
// Nothing is written to disk before step 7, so an aborted run
// leaves any previous bundle untouched.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{Context, Result};
use burn::backend::ndarray::NdArrayDevice;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{
    dataset::{LineDataset, LineSample},
    encoder::{SequenceEncoder, DEFAULT_MAX_LEN},
    loader::CsvDatasetLoader,
    splitter::stratified_split,
    vocabulary::Vocabulary,
};
use crate::domain::traits::LabeledSource;
use crate::infra::{
    artifacts::{ArtifactBundle, ArtifactStore},
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{
    model::LineClassifierConfig,
    trainer::{run_training, TrainBackend},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All settings of a training run. Serialisable so the primary
// directory records what produced its bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:     String,
    pub assets_dir:   String,
    pub export_dir:   String,
    pub max_len:      usize,
    pub epochs:       usize,
    pub batch_size:   usize,
    pub lr:           f64,
    pub seed:         u64,
    pub val_fraction: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:     "training_data".to_string(),
            assets_dir:   "assets".to_string(),
            export_dir:   "models".to_string(),
            max_len:      DEFAULT_MAX_LEN,
            epochs:       10,
            batch_size:   32,
            lr:           1e-3,
            seed:         42,
            val_fraction: 0.1,
        }
    }
}

/// What a successful run reports back to the CLI.
#[derive(Debug)]
pub struct TrainOutcome {
    /// Validation accuracy of the exported model, in [0, 1]
    pub final_accuracy: f64,
    /// Epoch with the lowest validation loss
    pub best_epoch:     usize,
    pub primary_dir:    PathBuf,
    pub export_dir:     PathBuf,
    pub history:        Vec<EpochMetrics>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainOutcome> {
        let cfg = &self.config;
        if cfg.batch_size == 0 {
            anyhow::bail!("batch size must be at least 1");
        }

        let primary = ArtifactStore::new(&cfg.assets_dir);
        let export  = ArtifactStore::new(&cfg.export_dir);

        // ── Step 1: Load every labeled dataset ────────────────────────────────
        tracing::info!("Loading labeled datasets from '{}'", cfg.data_dir);
        let corpus = CsvDatasetLoader::new(&cfg.data_dir).load_all()?;
        if corpus.is_empty() {
            anyhow::bail!("No valid training data found in '{}'", cfg.data_dir);
        }
        if corpus.len() < 2 {
            anyhow::bail!(
                "Need at least 2 labeled lines to train, found {}",
                corpus.len()
            );
        }

        // ── Step 2: Update or create the vocabulary ──────────────────────────
        // Existing words keep their indices; new words are appended.
        let prior_vocab = primary.vocab_store().load();
        let has_prior   = prior_vocab.is_some();
        let mut vocab = match prior_vocab {
            Some(vocab) => {
                tracing::info!("Updating existing vocabulary ({} entries)", vocab.len());
                vocab
            }
            None => {
                tracing::info!("Creating new vocabulary");
                Vocabulary::new()
            }
        };
        let added = vocab.fit(corpus.texts());
        tracing::info!("Vocabulary: {} entries ({} new)", vocab.len(), added);

        // ── Step 3: Encode with the shared encoder ────────────────────────────
        let encoder = SequenceEncoder::new(vocab, cfg.max_len);
        let samples: Vec<LineSample> = corpus
            .lines
            .iter()
            .map(|l| LineSample::new(encoder.encode(&l.line), l.label))
            .collect();

        // ── Step 4: Stratified train / validation split ──────────────────────
        let (train_samples, val_samples) =
            stratified_split(samples, cfg.val_fraction, cfg.seed, |s| s.label);
        tracing::info!(
            "Split: {} train, {} validation",
            train_samples.len(),
            val_samples.len()
        );

        // ── Step 5: Build Burn datasets ───────────────────────────────────────
        let train_dataset = LineDataset::new(train_samples);
        let val_dataset   = LineDataset::new(val_samples);

        // ── Step 6: Train (Layer 5) ───────────────────────────────────────────
        let vocab     = encoder.vocabulary();
        let model_cfg = LineClassifierConfig::new(vocab.embedding_rows()).with_max_len(cfg.max_len);
        model_cfg.check().map_err(anyhow::Error::msg)?;

        // weights without their vocabulary would map tokens to the wrong rows
        let prior = if has_prior {
            primary.load_prior_record::<TrainBackend>(&NdArrayDevice::default())
        } else {
            None
        };

        tracing::info!("Starting training: {} epochs", cfg.epochs);
        let outcome = run_training(cfg, &model_cfg, train_dataset, val_dataset, prior)?;

        // ── Step 7: Persist and export ────────────────────────────────────────
        let bundle = ArtifactBundle::build(&outcome.model, vocab, cfg.max_len)
            .context("Cannot export the trained model")?;
        primary.save_bundle(&bundle)?;
        primary.save_config(cfg)?;
        MetricsLogger::new(primary.dir())?.log_all(&outcome.history)?;
        primary.copy_bundle_to(&export)?;

        Ok(TrainOutcome {
            final_accuracy: outcome.final_accuracy,
            best_epoch:     outcome.best_epoch,
            primary_dir:    primary.dir().to_path_buf(),
            export_dir:     export.dir().to_path_buf(),
            history:        outcome.history,
        })
    }
}
