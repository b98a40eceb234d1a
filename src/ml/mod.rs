// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that builds, trains, exports or runs the classifier.
//
//   model.rs      — LineClassifier architecture:
//                   • Token embedding (row 0 = padding)
//                   • Conv1d, valid padding, ReLU
//                   • Global max-pool over time
//                   • Dense + ReLU, dropout, dense logit
//
//   loss.rs       — Sample-weighted BCE on logits and accuracy
//
//   trainer.rs    — The training loop
//                   Forward pass, weighted loss, backward pass,
//                   Adam step, per-epoch validation
//
//   quantized.rs  — int8 export format (LCQM) and its ndarray
//                   forward pass; burn is not needed to run it
//
//   inferencer.rs — Encoder + quantized model, scores single lines
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Kim (2014) Convolutional Neural Networks for Sentence Classification

/// Embedding + CNN binary line classifier
pub mod model;

/// Weighted binary cross-entropy
pub mod loss;

/// Full training loop with validation
pub mod trainer;

/// Quantized inference model and file format
pub mod quantized;

/// Line scorer used by the clean command
pub mod inferencer;
