// ============================================================
// Layer 6 — Artifact Store
// ============================================================
// Saves and restores the Trained Artifact Bundle:
//
//   <dir>/
//     pdf_cleaner_model.lcq   ← quantized inference model
//     tokenizer.json          ← vocabulary snapshot it was trained with
//     model_weights.mpk       ← full-precision burn record (continued training)
//     train_config.json       ← run settings (primary directory only)
//     metrics.csv             ← per-epoch history (primary directory only)
//
// The three bundle files are serialised in memory first
// (`ArtifactBundle::build`), so nothing touches the disk unless
// every artifact could be produced. Each file is then written
// atomically. The distribution copy is made from the primary
// files byte for byte.
//
// Weights use burn's named MessagePack recorder with full
// precision settings; a failing or incompatible snapshot is
// reported and training starts from fresh weights.

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkBytesRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::data::vocabulary::Vocabulary;
use crate::infra::atomic_io::{atomic_copy, atomic_write};
use crate::infra::vocab_store::{self, VocabularyStore, VOCAB_FILE};
use crate::ml::model::{LineClassifier, LineClassifierRecord};
use crate::ml::quantized::{QuantizedLineClassifier, QuantizedModel};

pub const MODEL_FILE:   &str = "pdf_cleaner_model.lcq";
pub const WEIGHTS_FILE: &str = "model_weights.mpk";
pub const CONFIG_FILE:  &str = "train_config.json";

type WeightsRecorder = NamedMpkBytesRecorder<FullPrecisionSettings>;

/// The three artifacts of one export, already serialised.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactBundle {
    pub model:      Vec<u8>,
    pub vocabulary: Vec<u8>,
    pub weights:    Vec<u8>,
}

impl ArtifactBundle {
    pub fn build<B: Backend>(
        model:   &LineClassifier<B>,
        vocab:   &Vocabulary,
        max_len: usize,
    ) -> Result<Self> {
        let quantized = QuantizedModel::from_classifier(model, max_len)?;
        if quantized.header.vocab_rows != vocab.embedding_rows() {
            anyhow::bail!(
                "model has {} embedding rows but the vocabulary needs {}",
                quantized.header.vocab_rows,
                vocab.embedding_rows()
            );
        }

        let weights = WeightsRecorder::default()
            .record(model.clone().into_record(), ())
            .map_err(|e| anyhow::anyhow!("Cannot serialise weights: {e:?}"))?;

        Ok(Self {
            model:      quantized.to_bytes()?,
            vocabulary: vocab_store::to_json_bytes(vocab)?,
            weights,
        })
    }

    fn files(&self) -> [(&'static str, &[u8]); 3] {
        [
            (MODEL_FILE,   self.model.as_slice()),
            (VOCAB_FILE,   self.vocabulary.as_slice()),
            (WEIGHTS_FILE, self.weights.as_slice()),
        ]
    }
}

/// One directory holding a bundle.
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    pub fn weights_path(&self) -> PathBuf {
        self.dir.join(WEIGHTS_FILE)
    }

    pub fn vocab_store(&self) -> VocabularyStore {
        VocabularyStore::new(&self.dir)
    }

    pub fn bundle_paths(&self) -> [PathBuf; 3] {
        [MODEL_FILE, VOCAB_FILE, WEIGHTS_FILE].map(|name| self.dir.join(name))
    }

    pub fn save_bundle(&self, bundle: &ArtifactBundle) -> Result<()> {
        for (name, bytes) in bundle.files() {
            let path = self.dir.join(name);
            atomic_write(&path, bytes)?;
            tracing::info!("Saved {} ({} bytes)", path.display(), bytes.len());
        }
        Ok(())
    }

    /// Duplicate this store's bundle into `target`, byte for byte.
    pub fn copy_bundle_to(&self, target: &ArtifactStore) -> Result<()> {
        for (from, to) in self.bundle_paths().iter().zip(target.bundle_paths().iter()) {
            atomic_copy(from, to)?;
        }
        tracing::info!("Bundle also exported to: {}", target.dir.display());
        Ok(())
    }

    /// Previous weights snapshot, if one exists and can be decoded.
    pub fn load_prior_record<B: Backend>(&self, device: &B::Device) -> Option<LineClassifierRecord<B>> {
        let path = self.weights_path();
        if !path.exists() {
            return None;
        }
        let loaded: Result<LineClassifierRecord<B>> = fs::read(&path)
            .map_err(anyhow::Error::from)
            .and_then(|bytes| {
                WeightsRecorder::default()
                    .load(bytes, device)
                    .map_err(|e| anyhow::anyhow!("{e:?}"))
            });
        match loaded {
            Ok(record) => {
                tracing::info!("Loading previous weights from '{}'", path.display());
                Some(record)
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable weights '{}': {}", path.display(), e);
                None
            }
        }
    }

    pub fn load_quantized(&self) -> Result<QuantizedLineClassifier> {
        let path  = self.model_path();
        let bytes = fs::read(&path)
            .with_context(|| format!(
                "Cannot read model '{}'. Have you run 'train' first?",
                path.display()
            ))?;
        QuantizedLineClassifier::from_bytes(&bytes)
            .with_context(|| format!("Invalid model file '{}'", path.display()))
    }

    /// Record the settings of the run that produced this bundle.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;
        atomic_write(&path, json.as_bytes())
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }
}
