// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Two jobs:
//
//   1. `clean_line` — trims a raw line pulled out of a PDF page
//      before it is scored or written out. Nothing inside the
//      line is touched.
//
//   2. `normalize` / `tokens` — the normalisation half of the
//      sequence encoder. Lower-cases the text and strips every
//      character that is not a word character, whitespace, or
//      one of `. , ; ? !`. Vocabulary fitting and encoding both
//      go through here, so a token seen at training time is
//      spelled exactly the same at inference time.

use once_cell::sync::Lazy;
use regex::Regex;

/// Everything outside word chars, whitespace and `.,;?!` is dropped.
static STRIP_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\w\s.,;?!]").expect("static pattern is valid")
});

#[derive(Debug, Clone, Copy, Default)]
pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Strip surrounding whitespace from one extracted line. The
    /// inside of the line is kept as extracted, since this text is
    /// what gets written to the output files. Returns an empty string
    /// for lines that contain nothing but whitespace.
    pub fn clean_line(&self, line: &str) -> String {
        line.trim().to_string()
    }

    /// Lower-case and strip characters outside the whitelist.
    pub fn normalize(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        STRIP_PATTERN.replace_all(&lowered, "").into_owned()
    }

    /// Normalised text split on whitespace.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        self.normalize(text)
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}
