// ============================================================
// Layer 3 — Verdict Domain Types
// ============================================================
// The fixed decision rule that turns a model score into a
// keep/remove decision, and the typed per-line failures the
// cleaning batch tallies instead of swallowing.

use std::fmt;
use thiserror::Error;

/// Scores strictly above this value are content.
pub const DECISION_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Kept, written to the cleaned stream
    Content,
    /// Removed, written to the removed stream
    Noise,
}

impl Verdict {
    /// `score > 0.5` is content; exactly 0.5 is noise.
    pub fn from_score(score: f32) -> Self {
        if score > DECISION_THRESHOLD {
            Verdict::Content
        } else {
            Verdict::Noise
        }
    }
}

/// A line together with its model score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredLine {
    pub text:  String,
    pub score: f32,
}

impl ScoredLine {
    pub fn new(text: impl Into<String>, score: f32) -> Self {
        Self { text: text.into(), score }
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::from_score(self.score)
    }
}

/// Output format: `[0.87] Chapter 3: Overview`
impl fmt::Display for ScoredLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.2}] {}", self.score, self.text)
    }
}

/// Why a single line could not be scored.
#[derive(Debug, Error, PartialEq)]
pub enum LineError {
    #[error("model input rejected: {0}")]
    Input(String),

    #[error("model produced a non-finite score ({0})")]
    NonFiniteScore(f32),
}
