// ============================================================
// Layer 4 — Line Batcher
// ============================================================
// Implements Burn's Batcher trait to stack LineSamples into
// tensors for one forward pass:
//
//   inputs  [batch, max_len]  Int    encoded sequences
//   targets [batch]           Float  0.0 / 1.0
//   weights [batch]           Float  class weight of each target
//
// The class weights are computed once from the training split and
// copied into every batch, so the loss can weight each sample.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::{ClassWeights, LineSample};

#[derive(Debug, Clone)]
pub struct LineBatch<B: Backend> {
    pub inputs:  Tensor<B, 2, Int>,
    pub targets: Tensor<B, 1>,
    pub weights: Tensor<B, 1>,
}

#[derive(Clone, Debug)]
pub struct LineBatcher<B: Backend> {
    pub device:        B::Device,
    pub class_weights: ClassWeights,
}

impl<B: Backend> LineBatcher<B> {
    pub fn new(device: B::Device, class_weights: ClassWeights) -> Self {
        Self { device, class_weights }
    }
}

impl<B: Backend> Batcher<LineSample, LineBatch<B>> for LineBatcher<B> {
    fn batch(&self, items: Vec<LineSample>) -> LineBatch<B> {
        let batch_size = items.len();
        // every sample is already padded to max_len
        let seq_len    = items.first().map(|s| s.ids.len()).unwrap_or(0);

        let ids_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.ids.iter().map(|&x| x as i32))
            .collect();
        let targets: Vec<f32> = items.iter().map(|s| s.label.as_f32()).collect();
        let weights: Vec<f32> = items
            .iter()
            .map(|s| self.class_weights.weight(s.label))
            .collect();

        let inputs = Tensor::<B, 1, Int>::from_ints(ids_flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);
        let targets = Tensor::<B, 1>::from_floats(targets.as_slice(), &self.device);
        let weights = Tensor::<B, 1>::from_floats(weights.as_slice(), &self.device);

        LineBatch { inputs, targets, weights }
    }
}
