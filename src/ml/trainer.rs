// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full train + validation loop using Burn's DataLoader and Adam.
//
//   - Training uses TrainBackend (Autodiff<NdArray>) for gradients
//   - model.valid() returns the model on EvalBackend (NdArray),
//     with dropout disabled
//   - Validation batcher must also use EvalBackend
//   - Training batches carry balanced class weights, validation
//     batches carry uniform ones, so val_loss is plain BCE
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::LineBatcher,
    dataset::{ClassWeights, LineDataset},
};
use crate::infra::metrics::EpochMetrics;
use crate::ml::loss::{count_correct, weighted_bce_with_logits};
use crate::ml::model::{LineClassifier, LineClassifierConfig, LineClassifierRecord};

pub type TrainBackend = Autodiff<NdArray>;
pub type EvalBackend  = NdArray;

pub struct TrainingOutcome {
    pub model:          LineClassifier<EvalBackend>,
    pub history:        Vec<EpochMetrics>,
    /// Validation accuracy of the final model, in [0, 1]
    pub final_accuracy: f64,
    /// Epoch with the lowest validation loss (0 when no epoch ran)
    pub best_epoch:     usize,
}

pub fn run_training(
    cfg:       &TrainConfig,
    model_cfg: &LineClassifierConfig,
    train:     LineDataset,
    val:       LineDataset,
    prior:     Option<LineClassifierRecord<TrainBackend>>,
) -> Result<TrainingOutcome> {
    model_cfg.check().map_err(anyhow::Error::msg)?;
    if train.sample_count() == 0 || val.sample_count() == 0 {
        anyhow::bail!(
            "Both splits need samples (train={}, val={})",
            train.sample_count(),
            val.sample_count()
        );
    }

    let device = NdArrayDevice::default();
    TrainBackend::seed(cfg.seed);

    // ── Build model ───────────────────────────────────────────────────────────
    let fresh: LineClassifier<TrainBackend> = model_cfg.init(&device);
    let mut model = match prior {
        Some(record) => match fresh.clone().load_prior(record) {
            Ok(model) => model,
            Err(e) => {
                tracing::warn!("Previous weights are incompatible ({}), starting fresh", e);
                fresh
            }
        },
        None => fresh,
    };
    tracing::info!(
        "Model ready: {} embedding rows, {} filters, kernel {}",
        model.vocab_rows(), model_cfg.filters, model_cfg.kernel_size
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let mut optim = AdamConfig::new().with_epsilon(1e-7).init();

    let class_weights = ClassWeights::balanced(&train.labels());
    tracing::info!(
        "Class weights: noise={:.3} content={:.3}",
        class_weights.noise, class_weights.content
    );

    // ── Training data loader (TrainBackend) ───────────────────────────────────
    let train_batcher = LineBatcher::<TrainBackend>::new(device.clone(), class_weights);
    let train_loader  = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .build(train);

    // ── Validation data loader (EvalBackend, no autodiff overhead) ───────────
    let val_batcher = LineBatcher::<EvalBackend>::new(device.clone(), ClassWeights::uniform());
    let val_loader  = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.batch_size)
        .build(val);

    let mut history       = Vec::with_capacity(cfg.epochs);
    let mut best_val_loss = f64::INFINITY;
    let mut best_epoch    = 0usize;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;
        let mut train_correct  = 0usize;
        let mut train_total    = 0usize;

        for batch in train_loader.iter() {
            let logits = model.forward_logits(batch.inputs);
            let loss   = weighted_bce_with_logits(
                logits.clone(),
                batch.targets.clone(),
                batch.weights,
            );

            train_loss_sum += loss.clone().into_scalar().elem::<f64>();
            train_batches  += 1;
            train_total    += batch.targets.dims()[0];
            train_correct  += count_correct(logits.detach(), batch.targets);

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();

        let mut val_loss_sum = 0.0f64;
        let mut val_batches  = 0usize;
        let mut val_correct  = 0usize;
        let mut val_total    = 0usize;

        for batch in val_loader.iter() {
            let logits = model_valid.forward_logits(batch.inputs);
            let loss   = weighted_bce_with_logits(
                logits.clone(),
                batch.targets.clone(),
                batch.weights,
            );

            val_loss_sum += loss.into_scalar().elem::<f64>();
            val_batches  += 1;
            val_total    += batch.targets.dims()[0];
            val_correct  += count_correct(logits, batch.targets);
        }

        let metrics = EpochMetrics::new(
            epoch,
            ratio(train_loss_sum, train_batches),
            ratio(train_correct as f64, train_total),
            ratio(val_loss_sum, val_batches),
            ratio(val_correct as f64, val_total),
        );

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | train_acc={:.1}% | val_loss={:.4} | val_acc={:.1}%",
            epoch, cfg.epochs,
            metrics.train_loss, metrics.train_acc * 100.0,
            metrics.val_loss, metrics.val_acc * 100.0,
        );

        if metrics.is_improvement(best_val_loss) {
            best_val_loss = metrics.val_loss;
            best_epoch    = epoch;
        }
        history.push(metrics);
    }

    let final_accuracy = history.last().map(|m| m.val_acc).unwrap_or(0.0);
    tracing::info!(
        "Training complete! val_acc={:.2}%, best val_loss={:.4} at epoch {}",
        final_accuracy * 100.0, best_val_loss, best_epoch
    );

    Ok(TrainingOutcome {
        model: model.valid(),
        history,
        final_accuracy,
        best_epoch,
    })
}

fn ratio(sum: f64, count: usize) -> f64 {
    if count > 0 { sum / count as f64 } else { f64::NAN }
}
