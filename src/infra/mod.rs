// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence used by several layers:
//
//   artifacts.rs   — the Trained Artifact Bundle (quantized model,
//                    vocabulary, raw weights): build, save, copy
//                    to the distribution directory, reload
//
//   vocab_store.rs — tokenizer.json load (tolerant or strict) and save
//
//   atomic_io.rs   — temp-file-and-rename writes
//
//   metrics.rs     — per-epoch CSV history

/// Model bundle saving, duplication and loading
pub mod artifacts;

/// Vocabulary persistence
pub mod vocab_store;

/// Crash-safe file writes
pub mod atomic_io;

/// Training metrics CSV logger
pub mod metrics;
