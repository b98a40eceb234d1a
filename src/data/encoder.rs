// ============================================================
// Layer 4 — Sequence Encoder
// ============================================================
// The single text → fixed-length index sequence routine.
//
//   "Chapter 3: Overview"
//       │  Preprocessor::tokens  (lower-case, strip, split)
//       ▼
//   ["chapter", "3", "overview"]
//       │  Vocabulary::index_of  (OOV on miss)
//       ▼
//   [17, 42, 1]
//       │  pad / truncate, both from the LEFT
//       ▼
//   [0, 0, ..., 0, 17, 42, 1]            (exactly max_len values)
//
// Long lines keep their LAST max_len tokens. Training builds its
// samples through `SequenceEncoder::encode` and the inferencer
// scores through the same method, so the two paths cannot drift.

use crate::data::preprocessor::Preprocessor;
use crate::data::vocabulary::{Vocabulary, PAD_INDEX};

pub const DEFAULT_MAX_LEN: usize = 100;

/// Left-pad with 0 / left-truncate `ids` to exactly `max_len`.
pub fn pad_pre(ids: &[u32], max_len: usize) -> Vec<u32> {
    if ids.len() >= max_len {
        return ids[ids.len() - max_len..].to_vec();
    }
    let mut out = vec![PAD_INDEX; max_len - ids.len()];
    out.extend_from_slice(ids);
    out
}

#[derive(Debug, Clone)]
pub struct SequenceEncoder {
    vocabulary: Vocabulary,
    max_len:    usize,
    prep:       Preprocessor,
}

impl SequenceEncoder {
    pub fn new(vocabulary: Vocabulary, max_len: usize) -> Self {
        Self { vocabulary, max_len, prep: Preprocessor::new() }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Unpadded index sequence.
    pub fn token_ids(&self, text: &str) -> Vec<u32> {
        self.prep
            .tokens(text)
            .iter()
            .map(|w| self.vocabulary.index_of(w))
            .collect()
    }

    /// Exactly `max_len` indices.
    pub fn encode(&self, text: &str) -> Vec<u32> {
        pad_pre(&self.token_ids(text), self.max_len)
    }

    /// The same encoding as `encode`, as the `[1, max_len]` f32 row the
    /// quantized model takes as input.
    pub fn encode_f32(&self, text: &str) -> Vec<f32> {
        self.encode(text).into_iter().map(|id| id as f32).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder(max_len: usize) -> SequenceEncoder {
        let mut v = Vocabulary::new();
        v.fit(["chapter three overview page"]);
        SequenceEncoder::new(v, max_len)
    }

    #[test]
    fn test_length_is_always_max_len() {
        let enc = encoder(DEFAULT_MAX_LEN);
        let long = "word ".repeat(250);
        for text in ["", "chapter", "— * —", long.as_str()] {
            assert_eq!(enc.encode(text).len(), DEFAULT_MAX_LEN);
        }
    }

    #[test]
    fn test_short_sequences_are_left_padded() {
        let enc = encoder(5);
        assert_eq!(enc.encode("Chapter Three"), vec![0, 0, 0, 2, 3]);
    }

    #[test]
    fn test_long_sequences_keep_last_tokens() {
        let enc = encoder(3);
        // chapter three overview page → [2, 3, 4, 5]
        assert_eq!(enc.encode("chapter three overview page"), vec![3, 4, 5]);
    }

    #[test]
    fn test_unknown_words_map_to_oov() {
        let enc = encoder(4);
        assert_eq!(enc.encode("chapter unknown"), vec![0, 0, 2, 1]);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let enc = encoder(DEFAULT_MAX_LEN);
        let text = "Page 12 — Chapter Three, overview!";
        assert_eq!(enc.encode(text), enc.encode(text));
        assert_eq!(enc.encode(text), encoder(DEFAULT_MAX_LEN).encode(text));
    }

    #[test]
    fn test_values_are_pad_oov_or_known() {
        let enc = encoder(DEFAULT_MAX_LEN);
        let max = enc.vocabulary().max_index();
        for id in enc.encode("chapter zzz three yyy") {
            assert!(id <= max);
        }
    }

    #[test]
    fn test_encode_f32_matches_encode() {
        let enc = encoder(6);
        let ints: Vec<f32> = enc.encode("three page").iter().map(|&i| i as f32).collect();
        assert_eq!(enc.encode_f32("three page"), ints);
    }

    #[test]
    fn test_pad_pre_exact_length_is_unchanged() {
        assert_eq!(pad_pre(&[7, 8, 9], 3), vec![7, 8, 9]);
        assert_eq!(pad_pre(&[], 2), vec![0, 0]);
    }
}
