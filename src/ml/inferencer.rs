// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Scores single lines with the quantized model. Built once per
// process from a bundle directory and passed by reference to
// whoever needs scores; there is no global model state.
use anyhow::Result;

use crate::data::encoder::SequenceEncoder;
use crate::domain::traits::LineScorer;
use crate::domain::verdict::LineError;
use crate::infra::artifacts::ArtifactStore;
use crate::ml::quantized::QuantizedLineClassifier;

pub struct Inferencer {
    encoder: SequenceEncoder,
    model:   QuantizedLineClassifier,
}

impl Inferencer {
    /// Pair an encoder with a model, refusing mismatched bundles.
    pub fn new(encoder: SequenceEncoder, model: QuantizedLineClassifier) -> Result<Self> {
        let header = model.header();
        if header.max_len != encoder.max_len() {
            anyhow::bail!(
                "model expects sequences of {} tokens, encoder produces {}",
                header.max_len,
                encoder.max_len()
            );
        }
        let rows = encoder.vocabulary().embedding_rows();
        if header.vocab_rows != rows {
            anyhow::bail!(
                "model has {} embedding rows but the vocabulary needs {}; \
                 model and tokenizer.json come from different training runs",
                header.vocab_rows,
                rows
            );
        }
        Ok(Self { encoder, model })
    }

    pub fn from_bundle(store: &ArtifactStore) -> Result<Self> {
        let model   = store.load_quantized()?;
        let vocab   = store.vocab_store().load_required()?;
        let encoder = SequenceEncoder::new(vocab, model.header().max_len);
        let inferencer = Self::new(encoder, model)?;
        tracing::info!(
            "Model loaded from '{}' ({} vocabulary entries)",
            store.dir().display(),
            inferencer.encoder.vocabulary().len()
        );
        Ok(inferencer)
    }
}

impl LineScorer for Inferencer {
    fn score(&self, text: &str) -> std::result::Result<f32, LineError> {
        let input = self.encoder.encode_f32(text);
        let score = self
            .model
            .predict(&input)
            .map_err(|e| LineError::Input(e.to_string()))?;
        if !score.is_finite() {
            return Err(LineError::NonFiniteScore(score));
        }
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::vocabulary::Vocabulary;
    use crate::ml::model::LineClassifierConfig;
    use crate::ml::quantized::QuantizedModel;
    use burn::backend::NdArray;

    fn quantized_for(vocab: &Vocabulary, max_len: usize) -> QuantizedLineClassifier {
        let model = LineClassifierConfig::new(vocab.embedding_rows())
            .with_max_len(max_len)
            .with_embedding_dim(4)
            .with_filters(3)
            .with_hidden(2)
            .init::<NdArray>(&Default::default());
        let q = QuantizedModel::from_classifier(&model, max_len).unwrap();
        QuantizedLineClassifier::new(&q).unwrap()
    }

    fn vocab() -> Vocabulary {
        let mut v = Vocabulary::new();
        v.fit(["chapter one introduction", "page 12"]);
        v
    }

    #[test]
    fn test_scores_are_probabilities() {
        let v = vocab();
        let inferencer = Inferencer::new(SequenceEncoder::new(v.clone(), 10), quantized_for(&v, 10)).unwrap();
        for line in ["Chapter One", "page 12", "never seen before", ""] {
            let score = inferencer.score(line).unwrap();
            assert!((0.0..=1.0).contains(&score), "{line}: {score}");
        }
        // deterministic
        assert_eq!(inferencer.score("page 12").unwrap(), inferencer.score("page 12").unwrap());
    }

    #[test]
    fn test_rejects_vocabulary_from_another_run() {
        let v = vocab();
        let model = quantized_for(&v, 10);
        let mut grown = v.clone();
        grown.fit(["extra words here"]);
        assert!(Inferencer::new(SequenceEncoder::new(grown, 10), model).is_err());
    }

    #[test]
    fn test_rejects_mismatched_sequence_length() {
        let v = vocab();
        assert!(Inferencer::new(SequenceEncoder::new(v.clone(), 12), quantized_for(&v, 10)).is_err());
    }
}
