// ============================================================
// Layer 4 — PDF Line Extractor
// ============================================================
// Pulls the text of every page out of a PDF with lopdf and
// splits it on line breaks. Lines are tidied by the
// Preprocessor; blank lines are dropped. Page order and line
// order within a page are preserved.
//
// A page whose text cannot be extracted is logged and skipped;
// a document that cannot be opened at all is an error for the
// caller to record. The lopdf `Document` is dropped at the end of
// `extract_lines` on every path.

use anyhow::{Context, Result};
use lopdf::Document;
use std::{fs, path::{Path, PathBuf}};

use crate::data::preprocessor::Preprocessor;
use crate::domain::traits::LineSource;

#[derive(Debug, Clone, Default)]
pub struct PdfLineExtractor {
    prep: Preprocessor,
}

impl PdfLineExtractor {
    pub fn new() -> Self {
        Self { prep: Preprocessor::new() }
    }

    /// `.pdf` files in a directory, sorted by name.
    pub fn discover(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("Cannot read input directory '{}'", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case("pdf"))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();
        Ok(files)
    }

    /// Split one page's text into cleaned, non-empty lines.
    pub fn split_page_text(&self, text: &str) -> Vec<String> {
        text.split('\n')
            .map(|line| self.prep.clean_line(line))
            .filter(|line| !line.is_empty())
            .collect()
    }
}

impl LineSource for PdfLineExtractor {
    fn extract_lines(&self, path: &Path) -> Result<Vec<String>> {
        let document = Document::load(path)
            .with_context(|| format!("Cannot open PDF '{}'", path.display()))?;

        let mut lines = Vec::new();
        for page_num in document.get_pages().keys().copied() {
            match document.extract_text(&[page_num]) {
                Ok(text) => lines.extend(self.split_page_text(&text)),
                Err(e) => {
                    tracing::warn!(
                        "Skipping page {} of '{}': {}",
                        page_num,
                        path.display(),
                        e
                    );
                }
            }
        }

        tracing::debug!("Extracted {} lines from '{}'", lines.len(), path.display());
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_page_text_drops_blank_lines_and_trims() {
        let x = PdfLineExtractor::new();
        let lines = x.split_page_text("  Header  \n\n Body line one\r\n\t\n12\n");
        assert_eq!(lines, vec!["Header", "Body line one", "12"]);
    }

    #[test]
    fn test_split_page_text_keeps_line_interior() {
        let x = PdfLineExtractor::new();
        let lines = x.split_page_text("Page\u{00A0}4\tof 9  \n");
        assert_eq!(lines, vec!["Page\u{00A0}4\tof 9"]);
    }

    #[test]
    fn test_discover_finds_only_pdfs_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        let found = PdfLineExtractor::discover(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }

    #[test]
    fn test_unreadable_pdf_is_an_error() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"this is not a pdf").unwrap();
        assert!(PdfLineExtractor::new().extract_lines(&path).is_err());
    }
}
