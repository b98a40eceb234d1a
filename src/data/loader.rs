// ============================================================
// Layer 4 — Labeled Dataset Loader
// ============================================================
// Loads every `.csv` file in a directory as an independent
// labeled source. Each file needs a header row with at least a
// `line` and a `label` column; other columns are ignored.
//
// Per-file failures (unreadable file, missing column, undecodable
// record) skip that file with a warning. Per-row problems (empty
// line, empty, absent or non-binary label) silently drop the row. A file
// whose rows are all dropped contributes nothing and is recorded
// as skipped.

use anyhow::Result;
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::domain::labeled_line::{Label, LabeledCorpus, LabeledLine};
use crate::domain::traits::LabeledSource;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("no .csv files found in '{0}'")]
    NoSources(String),

    #[error("cannot open: {0}")]
    Open(#[source] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("malformed record: {0}")]
    Record(#[source] csv::Error),

    #[error("no valid rows after filtering")]
    NoValidRows,
}

/// Loads all `.csv` files from a given directory.
pub struct CsvDatasetLoader {
    dir: String,
}

impl CsvDatasetLoader {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: dir.into() }
    }

    /// `.csv` files in the directory, sorted by name so runs are reproducible.
    fn discover(&self) -> Vec<PathBuf> {
        let dir = Path::new(&self.dir);
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Cannot read data directory '{}': {}", self.dir, e);
                return Vec::new();
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("csv"))
            .collect();
        files.sort();
        files
    }
}

impl LabeledSource for CsvDatasetLoader {
    fn load_all(&self) -> Result<LabeledCorpus> {
        let files = self.discover();
        if files.is_empty() {
            return Err(DatasetError::NoSources(self.dir.clone()).into());
        }

        let mut corpus = LabeledCorpus::default();
        for path in files {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string();

            match load_labeled_csv(&path) {
                Ok(lines) => {
                    tracing::info!("Loaded: {} ({} rows)", name, lines.len());
                    corpus.loaded.push((name, lines.len()));
                    corpus.lines.extend(lines);
                }
                Err(DatasetError::NoValidRows) => {
                    tracing::info!("Skipping {}: no valid rows", name);
                    corpus.skipped.push((name, DatasetError::NoValidRows.to_string()));
                }
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", name, e);
                    corpus.skipped.push((name, e.to_string()));
                }
            }
        }

        tracing::info!(
            "Merged {} labeled lines from {} file(s), skipped {}",
            corpus.len(),
            corpus.loaded.len(),
            corpus.skipped.len(),
        );
        Ok(corpus)
    }
}

/// Parse one labeled CSV file, keeping only rows with a non-empty
/// `line` and a `label` of exactly 0 or 1.
pub fn load_labeled_csv(path: &Path) -> Result<Vec<LabeledLine>, DatasetError> {
    // flexible: a short row reads its missing cells as absent and is
    // dropped by `filter_row`; cells past the header are ignored
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(DatasetError::Open)?;

    let headers = reader.headers().map_err(DatasetError::Record)?.clone();
    let column  = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(DatasetError::MissingColumn(name))
    };
    let line_col  = column("line")?;
    let label_col = column("label")?;

    let mut lines = Vec::new();
    for record in reader.records() {
        let record = record.map_err(DatasetError::Record)?;
        if let Some(example) = filter_row(record.get(line_col), record.get(label_col)) {
            lines.push(example);
        }
    }

    if lines.is_empty() {
        return Err(DatasetError::NoValidRows);
    }
    Ok(lines)
}

/// Row filter: both cells present, line non-empty, label in {0, 1}.
pub fn filter_row(line: Option<&str>, label: Option<&str>) -> Option<LabeledLine> {
    let line  = line.filter(|l| !l.is_empty())?;
    let label = label.and_then(Label::parse)?;
    Some(LabeledLine::new(line, label))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &[u8]) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn test_filter_row_keeps_only_binary_labels() {
        let rows = [
            (Some("keep zero"), Some("0")),
            (Some("keep one"),  Some("1")),
            (Some("two"),       Some("2")),
            (Some("none"),      None),
            (Some("blank"),     Some("")),
            (None,              Some("1")),
            (Some(""),          Some("0")),
        ];
        let kept: Vec<String> = rows
            .iter()
            .filter_map(|(line, label)| filter_row(*line, *label))
            .map(|l| l.line)
            .collect();
        assert_eq!(kept, vec!["keep zero", "keep one"]);
    }

    #[test]
    fn test_load_csv_filters_rows_and_handles_quoting() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.csv", b"line,label,source\n\
            \"Chapter 1, Intro\",1,x\n\
            Page 4,0,x\n\
            bad label,2,x\n\
            missing label,,x\n\
            ,1,x\n");

        let lines = load_labeled_csv(&dir.path().join("a.csv")).unwrap();
        assert_eq!(lines, vec![
            LabeledLine::new("Chapter 1, Intro", Label::Content),
            LabeledLine::new("Page 4", Label::Noise),
        ]);
    }

    #[test]
    fn test_short_row_drops_only_that_row() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.csv", b"line,label\nbody text,1\nPage 4\nfooter,0\n");

        let lines = load_labeled_csv(&dir.path().join("a.csv")).unwrap();
        assert_eq!(lines, vec![
            LabeledLine::new("body text", Label::Content),
            LabeledLine::new("footer", Label::Noise),
        ]);
    }

    #[test]
    fn test_short_row_with_label_first_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.csv", b"label,line\n1\n0,Page 9\n");

        let lines = load_labeled_csv(&dir.path().join("a.csv")).unwrap();
        assert_eq!(lines, vec![LabeledLine::new("Page 9", Label::Noise)]);
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.csv", b"text,label\nhello,1\n");
        let err = load_labeled_csv(&dir.path().join("a.csv")).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn("line")));
    }

    #[test]
    fn test_load_all_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "good.csv", b"line,label\nbody text,1\nPage 2,0\n");
        write(dir.path(), "ragged.csv", b"line,label\nok,1\ntoo,0,extra\n");
        write(dir.path(), "binary.csv", &[0x6c, 0x69, 0x6e, 0x65, 0x2c, 0x6c, 0x61, 0x62, 0x65, 0x6c, 0x0a, 0xff, 0xfe, 0x2c, 0x31, 0x0a]);
        write(dir.path(), "empty.csv", b"line,label\nfoo,7\n");
        write(dir.path(), "notes.txt", b"line,label\nignored,1\n");

        let corpus = CsvDatasetLoader::new(dir.path().to_string_lossy()).load_all().unwrap();
        assert_eq!(corpus.len(), 4);
        assert_eq!(corpus.loaded, vec![
            ("good.csv".to_string(), 2),
            ("ragged.csv".to_string(), 2),
        ]);
        assert_eq!(corpus.skipped.len(), 2);
    }

    #[test]
    fn test_no_csv_files_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "notes.txt", b"nothing");
        assert!(CsvDatasetLoader::new(dir.path().to_string_lossy()).load_all().is_err());
        assert!(CsvDatasetLoader::new("/definitely/not/here").load_all().is_err());
    }
}
