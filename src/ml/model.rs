use burn::{
    module::Param,
    nn::{
        conv::{Conv1d, Conv1dConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{relu, sigmoid},
};

use crate::data::encoder::DEFAULT_MAX_LEN;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct LineClassifierConfig {
    /// Embedding rows: highest vocabulary index + 1 (row 0 is padding)
    pub vocab_rows:    usize,
    #[config(default = "DEFAULT_MAX_LEN")]
    pub max_len:       usize,
    #[config(default = 64)]
    pub embedding_dim: usize,
    #[config(default = 64)]
    pub filters:       usize,
    #[config(default = 5)]
    pub kernel_size:   usize,
    #[config(default = 64)]
    pub hidden:        usize,
    #[config(default = 0.3)]
    pub dropout:       f64,
}

impl LineClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> LineClassifier<B> {
        LineClassifier {
            embedding: EmbeddingConfig::new(self.vocab_rows, self.embedding_dim).init(device),
            conv:      Conv1dConfig::new(self.embedding_dim, self.filters, self.kernel_size).init(device),
            dense:     LinearConfig::new(self.filters, self.hidden).init(device),
            dropout:   DropoutConfig::new(self.dropout).init(),
            output:    LinearConfig::new(self.hidden, 1).init(device),
        }
    }

    /// The valid convolution needs at least one full window.
    pub fn check(&self) -> Result<(), String> {
        if self.max_len < self.kernel_size {
            return Err(format!(
                "max_len {} is shorter than the convolution kernel {}",
                self.max_len, self.kernel_size
            ));
        }
        if self.vocab_rows < 2 {
            return Err("vocabulary must hold at least the OOV token".to_string());
        }
        Ok(())
    }
}

/// embedding → conv1d + ReLU → global max-pool → dense + ReLU → dropout → dense + sigmoid
#[derive(Module, Debug)]
pub struct LineClassifier<B: Backend> {
    pub embedding: Embedding<B>,
    pub conv:      Conv1d<B>,
    pub dense:     Linear<B>,
    pub dropout:   Dropout,
    pub output:    Linear<B>,
}

impl<B: Backend> LineClassifier<B> {
    /// inputs: [batch, max_len] → logits: [batch]
    pub fn forward_logits(&self, inputs: Tensor<B, 2, Int>) -> Tensor<B, 1> {
        let [batch_size, _] = inputs.dims();

        let x = self.embedding.forward(inputs);   // [batch, max_len, dim]
        let x = x.swap_dims(1, 2);                // [batch, dim, max_len]
        let x = relu(self.conv.forward(x));       // [batch, filters, max_len - k + 1]

        // global max-pool over time
        let [_, filters, _] = x.dims();
        let x = x.max_dim(2).reshape([batch_size, filters]);

        let x = relu(self.dense.forward(x));
        // dropout is a no-op outside an autodiff backend
        let x = self.dropout.forward(x);
        self.output.forward(x).reshape([batch_size])
    }

    /// Content probabilities in [0, 1]: [batch]
    pub fn forward(&self, inputs: Tensor<B, 2, Int>) -> Tensor<B, 1> {
        sigmoid(self.forward_logits(inputs))
    }

    pub fn vocab_rows(&self) -> usize {
        self.embedding.weight.val().dims()[0]
    }

    /// Load a previous weights snapshot into this freshly initialised model.
    ///
    /// When the vocabulary has grown since the snapshot, the snapshot's
    /// embedding keeps its rows and this model's fresh rows are appended
    /// for the new words. Any other shape difference is an error.
    pub fn load_prior(self, mut record: LineClassifierRecord<B>) -> Result<Self, String> {
        let prior = record.embedding.weight.val();
        let fresh = self.embedding.weight.val();
        let [prior_rows, prior_dim] = prior.dims();
        let [rows, dim]             = fresh.dims();

        if prior_dim != dim {
            return Err(format!("embedding dim {prior_dim} != {dim}"));
        }
        if prior_rows > rows {
            return Err(format!(
                "snapshot covers {prior_rows} vocabulary rows but the vocabulary has only {rows}"
            ));
        }
        let shapes_match = record.conv.weight.val().dims() == self.conv.weight.val().dims()
            && record.dense.weight.val().dims() == self.dense.weight.val().dims()
            && record.output.weight.val().dims() == self.output.weight.val().dims();
        if !shapes_match {
            return Err("convolution or dense layer shapes differ".to_string());
        }

        if prior_rows < rows {
            // detached, so the grown matrix is a fresh leaf on autodiff backends
            let extra = fresh.detach().slice([prior_rows..rows, 0..dim]);
            let grown = Tensor::cat(vec![prior.detach(), extra], 0);
            record.embedding.weight = Param::from_tensor(grown);
            tracing::info!("Extended embedding from {} to {} rows", prior_rows, rows);
        }
        Ok(self.load_record(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn small_config(rows: usize) -> LineClassifierConfig {
        LineClassifierConfig::new(rows)
            .with_max_len(12)
            .with_embedding_dim(8)
            .with_filters(4)
            .with_hidden(6)
    }

    #[test]
    fn test_default_architecture() {
        let cfg = LineClassifierConfig::new(10);
        assert_eq!(cfg.max_len, 100);
        assert_eq!(cfg.embedding_dim, 64);
        assert_eq!(cfg.filters, 64);
        assert_eq!(cfg.kernel_size, 5);
        assert_eq!(cfg.hidden, 64);
        assert!((cfg.dropout - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_forward_shapes_and_range() {
        let device = Default::default();
        let model: LineClassifier<TestBackend> = small_config(20).init(&device);

        let ids: Vec<i32> = (0..24).map(|i| i % 20).collect();
        let inputs = Tensor::<TestBackend, 1, Int>::from_ints(ids.as_slice(), &device)
            .reshape([2, 12]);

        let probs = model.forward(inputs).into_data().to_vec::<f32>().unwrap();
        assert_eq!(probs.len(), 2);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_check_rejects_short_max_len() {
        assert!(small_config(20).with_max_len(3).check().is_err());
        assert!(small_config(20).check().is_ok());
    }

    #[test]
    fn test_load_prior_grows_embedding() {
        let device = Default::default();
        let old: LineClassifier<TestBackend> = small_config(5).init(&device);
        let old_rows = old.embedding.weight.val().into_data().to_vec::<f32>().unwrap();

        let grown = small_config(9)
            .init::<TestBackend>(&device)
            .load_prior(old.into_record())
            .unwrap();

        assert_eq!(grown.vocab_rows(), 9);
        let new_rows = grown.embedding.weight.val().into_data().to_vec::<f32>().unwrap();
        assert_eq!(&new_rows[..old_rows.len()], old_rows.as_slice());
    }

    #[test]
    fn test_load_prior_grows_embedding_on_autodiff_backend() {
        type TrainBackend = burn::backend::Autodiff<NdArray>;
        let device = Default::default();
        let old: LineClassifier<TrainBackend> = small_config(5).init(&device);
        let old_rows = old.embedding.weight.val().into_data().to_vec::<f32>().unwrap();

        let grown = small_config(9)
            .init::<TrainBackend>(&device)
            .load_prior(old.into_record())
            .unwrap();
        assert_eq!(grown.vocab_rows(), 9);
        let new_rows = grown.embedding.weight.val().into_data().to_vec::<f32>().unwrap();
        assert_eq!(&new_rows[..old_rows.len()], old_rows.as_slice());

        // the grown embedding is still a trainable parameter
        let ids: Vec<i32> = (0..12).map(|i| i % 9).collect();
        let inputs = Tensor::<TrainBackend, 1, Int>::from_ints(ids.as_slice(), &device)
            .reshape([1, 12]);
        let grads = grown.forward_logits(inputs).sum().backward();
        assert!(grown.embedding.weight.grad(&grads).is_some());
    }

    #[test]
    fn test_load_prior_rejects_larger_snapshot() {
        let device = Default::default();
        let old: LineClassifier<TestBackend> = small_config(9).init(&device);
        let result = small_config(5)
            .init::<TestBackend>(&device)
            .load_prior(old.into_record());
        assert!(result.is_err());
    }
}
