// ============================================================
// Layer 2 — CleanUseCase
// ============================================================
// Batch cleaning of every PDF in a directory:
//
//   1. Load the scoring context once (vocabulary + quantized model)
//   2. Discover `.pdf` files, sorted by name
//   3. For each document, extract its lines and score each one
//   4. score > 0.5  → cleaned stream   `[0.87] line`
//      otherwise    → removed stream   `[0.12] line`
//
// Both output files are created once per run and receive the lines
// of every document in order. A document that cannot be opened is
// skipped; a line that cannot be scored is logged, tallied and left
// out of both streams.

use anyhow::{Context, Result};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::data::pdf_lines::PdfLineExtractor;
use crate::domain::traits::{LineScorer, LineSource};
use crate::domain::verdict::{ScoredLine, Verdict};
use crate::infra::artifacts::ArtifactStore;
use crate::ml::inferencer::Inferencer;

const PROGRESS_EVERY: usize = 100;

#[derive(Debug, Clone)]
pub struct CleanConfig {
    pub model_dir:    String,
    pub input_dir:    String,
    pub cleaned_path: PathBuf,
    pub removed_path: PathBuf,
}

/// Tallies of one cleaning run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub documents:         usize,
    pub skipped_documents: usize,
    pub total_lines:       usize,
    pub cleaned:           usize,
    pub removed:           usize,
    pub failed_lines:      usize,
}

pub struct CleanUseCase {
    config:     CleanConfig,
    inferencer: Inferencer,
    extractor:  PdfLineExtractor,
}

impl CleanUseCase {
    /// Loads the bundle from `model_dir`; fails if it is missing or inconsistent.
    pub fn new(config: CleanConfig) -> Result<Self> {
        let inferencer = Inferencer::from_bundle(&ArtifactStore::new(&config.model_dir))?;
        Ok(Self { config, inferencer, extractor: PdfLineExtractor::new() })
    }

    pub fn execute(&self) -> Result<CleanReport> {
        let cfg  = &self.config;
        let pdfs = PdfLineExtractor::discover(Path::new(&cfg.input_dir))?;
        if pdfs.is_empty() {
            tracing::warn!("No PDF files found in '{}'", cfg.input_dir);
        } else {
            tracing::info!("Found {} PDF file(s) in '{}'", pdfs.len(), cfg.input_dir);
        }

        let mut cleaned = create_output(&cfg.cleaned_path)?;
        let mut removed = create_output(&cfg.removed_path)?;

        let report = clean_documents(
            &self.extractor,
            &self.inferencer,
            &pdfs,
            &mut cleaned,
            &mut removed,
        )?;

        cleaned.flush()?;
        removed.flush()?;
        tracing::info!(
            "Cleaned lines written to '{}', removed lines to '{}'",
            cfg.cleaned_path.display(),
            cfg.removed_path.display()
        );
        Ok(report)
    }
}

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| format!("Cannot create output file '{}'", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Score every line of every document, in order, into the two streams.
pub fn clean_documents<S, R, W>(
    source:  &S,
    scorer:  &R,
    paths:   &[PathBuf],
    cleaned: &mut W,
    removed: &mut W,
) -> Result<CleanReport>
where
    S: LineSource,
    R: LineScorer,
    W: Write,
{
    let mut report = CleanReport::default();

    for path in paths {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");

        let lines = match source.extract_lines(path) {
            Ok(lines) => lines,
            Err(e) => {
                tracing::warn!("Skipping {}: {:#}", name, e);
                report.skipped_documents += 1;
                continue;
            }
        };

        tracing::info!("Processing {} ({} lines)", name, lines.len());
        let before = report.clone();
        partition_lines(scorer, &lines, cleaned, removed, &mut report)?;
        report.documents += 1;

        tracing::info!(
            "{}: {} kept, {} removed, {} failed",
            name,
            report.cleaned - before.cleaned,
            report.removed - before.removed,
            report.failed_lines - before.failed_lines,
        );
    }

    Ok(report)
}

/// Route each line by its verdict. Write failures abort; scoring failures do not.
pub fn partition_lines<R, W>(
    scorer:  &R,
    lines:   &[String],
    cleaned: &mut W,
    removed: &mut W,
    report:  &mut CleanReport,
) -> Result<()>
where
    R: LineScorer,
    W: Write,
{
    for (i, line) in lines.iter().enumerate() {
        report.total_lines += 1;

        match scorer.score(line) {
            Ok(score) => {
                let scored = ScoredLine::new(line.as_str(), score);
                match scored.verdict() {
                    Verdict::Content => {
                        writeln!(cleaned, "{scored}")?;
                        report.cleaned += 1;
                    }
                    Verdict::Noise => {
                        writeln!(removed, "{scored}")?;
                        report.removed += 1;
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Cannot score line {:?}: {}", line, e);
                report.failed_lines += 1;
            }
        }

        if (i + 1) % PROGRESS_EVERY == 0 {
            tracing::info!("  {}/{} lines", i + 1, lines.len());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::verdict::LineError;
    use std::collections::HashMap;

    struct FakeSource(HashMap<PathBuf, Vec<String>>);

    impl LineSource for FakeSource {
        fn extract_lines(&self, path: &Path) -> Result<Vec<String>> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("cannot open '{}'", path.display()))
        }
    }

    struct FakeScorer(HashMap<&'static str, f32>);

    impl LineScorer for FakeScorer {
        fn score(&self, text: &str) -> std::result::Result<f32, LineError> {
            self.0
                .get(text)
                .copied()
                .ok_or_else(|| LineError::Input(format!("unknown line {text}")))
        }
    }

    fn scorer() -> FakeScorer {
        FakeScorer(HashMap::from([
            ("Chapter 3: Overview", 0.87),
            ("Page 4", 0.12),
            ("boundary", 0.5),
            ("just above", 0.50001),
        ]))
    }

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_threshold_routes_boundary_to_removed() {
        let mut cleaned = Vec::new();
        let mut removed = Vec::new();
        let mut report  = CleanReport::default();

        partition_lines(
            &scorer(),
            &lines(&["boundary", "just above"]),
            &mut cleaned,
            &mut removed,
            &mut report,
        ).unwrap();

        assert_eq!(String::from_utf8(cleaned).unwrap(), "[0.50] just above\n");
        assert_eq!(String::from_utf8(removed).unwrap(), "[0.50] boundary\n");
        assert_eq!(report.cleaned, 1);
        assert_eq!(report.removed, 1);
    }

    #[test]
    fn test_documents_are_processed_in_order_and_failures_tallied() {
        let a = PathBuf::from("a.pdf");
        let b = PathBuf::from("b.pdf");
        let missing = PathBuf::from("missing.pdf");
        let source = FakeSource(HashMap::from([
            (a.clone(), lines(&["Chapter 3: Overview", "Page 4"])),
            (b.clone(), lines(&["Page 4", "unscorable", "Chapter 3: Overview"])),
        ]));

        let mut cleaned = Vec::new();
        let mut removed = Vec::new();
        let report = clean_documents(
            &source, &scorer(), &[a, missing, b], &mut cleaned, &mut removed,
        ).unwrap();

        assert_eq!(report, CleanReport {
            documents:         2,
            skipped_documents: 1,
            total_lines:       5,
            cleaned:           2,
            removed:           2,
            failed_lines:      1,
        });
        assert_eq!(
            String::from_utf8(cleaned).unwrap(),
            "[0.87] Chapter 3: Overview\n[0.87] Chapter 3: Overview\n"
        );
        assert_eq!(String::from_utf8(removed).unwrap(), "[0.12] Page 4\n[0.12] Page 4\n");
    }

    #[test]
    fn test_missing_bundle_fails_before_any_output() {
        let root = tempfile::tempdir().unwrap();
        let cfg = CleanConfig {
            model_dir:    root.path().join("models").to_string_lossy().into_owned(),
            input_dir:    root.path().to_string_lossy().into_owned(),
            cleaned_path: root.path().join("cleaned.txt"),
            removed_path: root.path().join("removed.txt"),
        };
        assert!(CleanUseCase::new(cfg.clone()).is_err());
        assert!(!cfg.cleaned_path.exists());
    }
}
