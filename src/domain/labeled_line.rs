// ============================================================
// Layer 3 — Labeled Line Domain Types
// ============================================================
// A raw text line paired with a binary label, plus the merged
// corpus produced by loading every labeled source.

use serde::{Deserialize, Serialize};

/// Binary class of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    /// Header, footer, page number or extraction artifact (0)
    Noise,
    /// Body text worth keeping (1)
    Content,
}

impl Label {
    /// Parse a raw label cell. Accepts `0`, `1`, and their float
    /// spellings (`0.0`, `1.0`); anything else is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let value: f64 = raw.trim().parse().ok()?;
        if value == 0.0 {
            Some(Label::Noise)
        } else if value == 1.0 {
            Some(Label::Content)
        } else {
            None
        }
    }

    pub fn as_index(self) -> usize {
        match self {
            Label::Noise   => 0,
            Label::Content => 1,
        }
    }

    pub fn as_f32(self) -> f32 {
        self.as_index() as f32
    }
}

/// One usable training example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledLine {
    pub line:  String,
    pub label: Label,
}

impl LabeledLine {
    pub fn new(line: impl Into<String>, label: Label) -> Self {
        Self { line: line.into(), label }
    }
}

/// Every example merged from all labeled sources, with a tally of
/// which sources contributed and which were skipped.
#[derive(Debug, Clone, Default)]
pub struct LabeledCorpus {
    pub lines:   Vec<LabeledLine>,
    /// (source name, rows kept)
    pub loaded:  Vec<(String, usize)>,
    /// (source name, reason)
    pub skipped: Vec<(String, String)>,
}

impl LabeledCorpus {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.line.as_str())
    }
}
