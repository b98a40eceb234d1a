// ============================================================
// Layer 4 — Vocabulary
// ============================================================
// Ordered word → index mapping shared by training and inference.
//
// Index layout:
//   0          padding (never assigned to a word)
//   1          the OOV token (by default)
//   2..        real words, in first-encounter order
//
// The mapping is append-only: `fit` only ever adds words after the
// current maximum index, so an encoding produced by an older
// snapshot is reproduced exactly by any newer one.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::data::preprocessor::Preprocessor;

pub const DEFAULT_OOV_TOKEN: &str = "<OOV>";
pub const DEFAULT_OOV_INDEX: u32 = 1;
pub const PAD_INDEX: u32 = 0;

/// On-disk and in-memory vocabulary.
/// Field names match the `tokenizer.json` layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub word_index: IndexMap<String, u32>,
    #[serde(default = "default_oov_token")]
    pub oov_token:  String,
}

fn default_oov_token() -> String {
    DEFAULT_OOV_TOKEN.to_string()
}

impl Vocabulary {
    /// Fresh vocabulary holding only the OOV token at index 1.
    pub fn new() -> Self {
        Self::with_oov_token(DEFAULT_OOV_TOKEN)
    }

    pub fn with_oov_token(oov_token: impl Into<String>) -> Self {
        let oov_token = oov_token.into();
        let mut word_index = IndexMap::new();
        word_index.insert(oov_token.clone(), DEFAULT_OOV_INDEX);
        Self { word_index, oov_token }
    }

    /// Index substituted for unknown words. Falls back to 1 when the
    /// OOV token itself is missing from the mapping.
    pub fn oov_index(&self) -> u32 {
        self.word_index
            .get(&self.oov_token)
            .copied()
            .unwrap_or(DEFAULT_OOV_INDEX)
    }

    pub fn len(&self) -> usize {
        self.word_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.word_index.is_empty()
    }

    pub fn max_index(&self) -> u32 {
        self.word_index.values().copied().max().unwrap_or(PAD_INDEX)
    }

    /// Number of embedding rows a model needs to cover every index,
    /// including the padding row. Equals `len() + 1` for a vocabulary
    /// built by `fit`; stays correct if a hand-edited file has gaps.
    pub fn embedding_rows(&self) -> usize {
        (self.max_index() as usize).max(self.len()).max(DEFAULT_OOV_INDEX as usize) + 1
    }

    pub fn get(&self, word: &str) -> Option<u32> {
        self.word_index.get(word).copied()
    }

    /// Look a normalised word up, substituting the OOV index on a miss.
    pub fn index_of(&self, word: &str) -> u32 {
        self.get(word).unwrap_or_else(|| self.oov_index())
    }

    /// Add every unseen token in `texts`. Returns how many were added.
    pub fn fit<'a, I>(&mut self, texts: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let prep      = Preprocessor::new();
        let mut next  = self.max_index() + 1;
        let mut added = 0usize;

        for text in texts {
            for token in prep.tokens(text) {
                if !self.word_index.contains_key(&token) {
                    self.word_index.insert(token, next);
                    next  += 1;
                    added += 1;
                }
            }
        }
        added
    }

    /// Check the invariants a persisted file must satisfy:
    /// at least one entry, every index positive and no index used twice.
    pub fn validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err("word_index is empty".to_string());
        }
        let mut seen = HashSet::with_capacity(self.word_index.len());
        for (word, &index) in &self.word_index {
            if index == PAD_INDEX {
                return Err(format!("word '{word}' uses the padding index 0"));
            }
            if !seen.insert(index) {
                return Err(format!("index {index} is assigned to more than one word"));
            }
        }
        if self.oov_token.is_empty() {
            return Err("oov_token is empty".to_string());
        }
        Ok(())
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_vocabulary_seeds_oov_at_one() {
        let v = Vocabulary::new();
        assert_eq!(v.len(), 1);
        assert_eq!(v.oov_index(), 1);
        assert_eq!(v.get("<OOV>"), Some(1));
        assert_eq!(v.embedding_rows(), 2);
    }

    #[test]
    fn test_fit_assigns_first_encounter_order() {
        let mut v = Vocabulary::new();
        let added = v.fit(["Page one", "page TWO"]);
        assert_eq!(added, 3);
        assert_eq!(v.get("page"), Some(2));
        assert_eq!(v.get("one"),  Some(3));
        assert_eq!(v.get("two"),  Some(4));
    }

    #[test]
    fn test_refit_keeps_existing_indices() {
        let mut v = Vocabulary::new();
        v.fit(["alpha beta"]);
        let before = v.clone();

        let added = v.fit(["beta alpha", "alpha"]);
        assert_eq!(added, 0);
        assert_eq!(v, before);
    }

    #[test]
    fn test_new_tokens_go_after_current_max() {
        let mut v = Vocabulary::new();
        v.fit(["alpha beta"]);
        let max_before = v.max_index();

        v.fit(["beta gamma"]);
        assert_eq!(v.get("alpha"), Some(2));
        assert_eq!(v.get("beta"),  Some(3));
        assert_eq!(v.get("gamma"), Some(max_before + 1));
    }

    #[test]
    fn test_fit_after_gap_never_reuses_an_index() {
        let mut v = Vocabulary::new();
        v.word_index.insert("far".to_string(), 10);
        v.fit(["near"]);
        assert_eq!(v.get("near"), Some(11));
        assert_eq!(v.embedding_rows(), 12);
    }

    #[test]
    fn test_index_of_unknown_word_is_oov() {
        let v = Vocabulary::new();
        assert_eq!(v.index_of("missing"), v.oov_index());
    }

    #[test]
    fn test_validate_rejects_duplicate_and_zero_indices() {
        let mut dup = Vocabulary::new();
        dup.word_index.insert("a".to_string(), 1);
        assert!(dup.validate().is_err());

        let mut zero = Vocabulary::new();
        zero.word_index.insert("a".to_string(), 0);
        assert!(zero.validate().is_err());

        assert!(Vocabulary::new().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_word_index() {
        let mut empty = Vocabulary::new();
        empty.word_index.clear();
        assert!(empty.is_empty());
        assert!(empty.validate().is_err());
    }
}
