use burn::prelude::*;

/// Sample-weighted binary cross-entropy on logits, averaged over the batch.
///
///   l_i = max(z, 0) - z·y + ln(1 + e^{-|z|})      (stable form)
///   L   = mean(w_i · l_i)
pub fn weighted_bce_with_logits<B: Backend>(
    logits:  Tensor<B, 1>,
    targets: Tensor<B, 1>,
    weights: Tensor<B, 1>,
) -> Tensor<B, 1> {
    let per_sample = logits.clone().clamp_min(0.0)
        - logits.clone() * targets
        + logits.abs().neg().exp().log1p();
    (per_sample * weights).mean()
}

/// Predictions with `sigmoid(z) > 0.5` (i.e. `z > 0`) that match their target.
pub fn count_correct<B: Backend>(logits: Tensor<B, 1>, targets: Tensor<B, 1>) -> usize {
    let predicted = logits.greater_elem(0.0).float();
    let correct: i64 = predicted
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();
    correct.max(0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn t(values: &[f32]) -> Tensor<TestBackend, 1> {
        Tensor::from_floats(values, &Default::default())
    }

    fn scalar(x: Tensor<TestBackend, 1>) -> f32 {
        x.into_scalar().elem::<f32>()
    }

    #[test]
    fn test_matches_plain_bce() {
        // z = 0 → p = 0.5 → loss = ln 2 for either target
        let loss = scalar(weighted_bce_with_logits(t(&[0.0, 0.0]), t(&[1.0, 0.0]), t(&[1.0, 1.0])));
        assert!((loss - std::f32::consts::LN_2).abs() < 1e-5);

        // z = 2, y = 1 → -ln(sigmoid(2))
        let expected = -(1.0f32 / (1.0 + (-2.0f32).exp())).ln();
        let loss = scalar(weighted_bce_with_logits(t(&[2.0]), t(&[1.0]), t(&[1.0])));
        assert!((loss - expected).abs() < 1e-5);
    }

    #[test]
    fn test_weights_scale_the_loss() {
        let base    = scalar(weighted_bce_with_logits(t(&[0.3]), t(&[1.0]), t(&[1.0])));
        let doubled = scalar(weighted_bce_with_logits(t(&[0.3]), t(&[1.0]), t(&[2.0])));
        assert!((doubled - 2.0 * base).abs() < 1e-5);
    }

    #[test]
    fn test_large_logits_stay_finite() {
        let loss = scalar(weighted_bce_with_logits(t(&[80.0, -80.0]), t(&[0.0, 1.0]), t(&[1.0, 1.0])));
        assert!(loss.is_finite());
        assert!((loss - 80.0).abs() < 1e-3);
    }

    #[test]
    fn test_count_correct_uses_strict_threshold() {
        // logit 0 → p = 0.5 → predicted noise
        let correct = count_correct(t(&[0.0, 0.1, -3.0, 4.0]), t(&[0.0, 1.0, 1.0, 0.0]));
        assert_eq!(correct, 2);
    }
}
