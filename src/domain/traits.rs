// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits, so the
// CSV loader, the PDF extractor and the quantized model can be
// replaced by in-memory fakes in tests.

use anyhow::Result;
use std::path::Path;

use crate::domain::labeled_line::LabeledCorpus;
use crate::domain::verdict::LineError;

// ─── LabeledSource ────────────────────────────────────────────────────────────
/// Anything that can produce the merged pool of labeled lines.
///
/// Implementations:
///   - CsvDatasetLoader → every `.csv` file in a directory
pub trait LabeledSource {
    /// Load and filter every labeled source. Individual broken
    /// sources are recorded in `LabeledCorpus::skipped`; an `Err`
    /// means the pool could not be built at all.
    fn load_all(&self) -> Result<LabeledCorpus>;
}

// ─── LineSource ───────────────────────────────────────────────────────────────
/// Anything that turns a document into an ordered sequence of raw lines.
///
/// Implementations:
///   - PdfLineExtractor → lopdf page text split on line breaks
pub trait LineSource {
    fn extract_lines(&self, path: &Path) -> Result<Vec<String>>;
}

// ─── LineScorer ───────────────────────────────────────────────────────────────
/// Anything that maps a line to a content probability in [0, 1].
///
/// Implementations:
///   - Inferencer → shared encoder + quantized classifier
pub trait LineScorer {
    fn score(&self, text: &str) -> std::result::Result<f32, LineError>;
}
