use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::labeled_line::Label;

/// One encoded training example: exactly `max_len` indices plus its label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSample {
    pub ids:   Vec<u32>,
    pub label: Label,
}

impl LineSample {
    pub fn new(ids: Vec<u32>, label: Label) -> Self {
        Self { ids, label }
    }
}

pub struct LineDataset {
    samples: Vec<LineSample>,
}

impl LineDataset {
    pub fn new(samples: Vec<LineSample>) -> Self { Self { samples } }
    pub fn sample_count(&self) -> usize { self.samples.len() }
    pub fn labels(&self) -> Vec<Label> { self.samples.iter().map(|s| s.label).collect() }
}

impl Dataset<LineSample> for LineDataset {
    fn get(&self, index: usize) -> Option<LineSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Per-class loss multipliers, `n_samples / (n_classes * count_c)`
/// over the classes present. The rarer class gets the larger weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassWeights {
    pub noise:   f32,
    pub content: f32,
}

impl ClassWeights {
    pub fn uniform() -> Self {
        Self { noise: 1.0, content: 1.0 }
    }

    pub fn balanced(labels: &[Label]) -> Self {
        let total   = labels.len();
        let content = labels.iter().filter(|&&l| l == Label::Content).count();
        let noise   = total - content;
        let present = usize::from(noise > 0) + usize::from(content > 0);
        if present == 0 {
            return Self::uniform();
        }

        let weight = |count: usize| {
            if count == 0 {
                1.0
            } else {
                total as f32 / (present as f32 * count as f32)
            }
        };
        Self { noise: weight(noise), content: weight(content) }
    }

    pub fn weight(&self, label: Label) -> f32 {
        match label {
            Label::Noise   => self.noise,
            Label::Content => self.content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(noise: usize, content: usize) -> Vec<Label> {
        let mut v = vec![Label::Noise; noise];
        v.extend(vec![Label::Content; content]);
        v
    }

    #[test]
    fn test_minority_class_is_up_weighted() {
        let w = ClassWeights::balanced(&labels(90, 10));
        assert!(w.content > w.noise);
        assert!((w.noise   - 100.0 / 180.0).abs() < 1e-6);
        assert!((w.content - 100.0 / 20.0).abs()  < 1e-6);
    }

    #[test]
    fn test_balanced_split_gives_equal_weights() {
        let w = ClassWeights::balanced(&labels(25, 25));
        assert_eq!(w.noise, 1.0);
        assert_eq!(w.content, 1.0);
    }

    #[test]
    fn test_single_class_and_empty() {
        let w = ClassWeights::balanced(&labels(0, 7));
        assert_eq!(w.content, 1.0);
        assert_eq!(ClassWeights::balanced(&[]), ClassWeights::uniform());
    }

    #[test]
    fn test_dataset_get_and_len() {
        let ds = LineDataset::new(vec![
            LineSample::new(vec![0, 2], Label::Content),
            LineSample::new(vec![0, 3], Label::Noise),
        ]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.get(1).unwrap().label, Label::Noise);
        assert!(ds.get(2).is_none());
    }
}
