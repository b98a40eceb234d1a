// ============================================================
// Layer 6 — Vocabulary Store
// ============================================================
// Persists the vocabulary as `tokenizer.json`:
//
//   {
//     "word_index": { "<OOV>": 1, "chapter": 2, ... },
//     "oov_token": "<OOV>"
//   }
//
// Writing happens as part of the artifact bundle (`to_json_bytes`).
// Training uses the tolerant `load`: a missing or broken file is
// logged and treated as absent so a fresh vocabulary is built.
// Inference uses `load_required`, because there is no sensible
// fresh state to fall back to when scoring.

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::data::vocabulary::Vocabulary;

pub const VOCAB_FILE: &str = "tokenizer.json";

pub struct VocabularyStore {
    dir: PathBuf,
}

impl VocabularyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(VOCAB_FILE)
    }

    /// Read the persisted vocabulary, or `None` if it is missing or malformed.
    pub fn load(&self) -> Option<Vocabulary> {
        let path = self.path();
        if !path.exists() {
            tracing::debug!("No vocabulary at '{}'", path.display());
            return None;
        }
        match read_vocabulary(&path) {
            Ok(vocab) => Some(vocab),
            Err(e) => {
                tracing::warn!("Failed loading vocabulary, starting fresh: {e:#}");
                None
            }
        }
    }

    pub fn load_required(&self) -> Result<Vocabulary> {
        read_vocabulary(&self.path())
    }

}

/// Pretty-printed UTF-8 JSON; non-ASCII words are written as-is.
pub fn to_json_bytes(vocab: &Vocabulary) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(vocab)?)
}

fn read_vocabulary(path: &Path) -> Result<Vocabulary> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read vocabulary '{}'", path.display()))?;
    let vocab: Vocabulary = serde_json::from_str(&json)
        .with_context(|| format!("Invalid vocabulary format in '{}'", path.display()))?;
    vocab
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid vocabulary '{}': {e}", path.display()))?;
    Ok(vocab)
}
