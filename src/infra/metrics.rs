// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends per-epoch training metrics to `metrics.csv` in the
// primary artifact directory, one row per epoch, so the history
// of every run stays available for plotting.
//
//   epoch,train_loss,train_acc,val_loss,val_acc
//   1,0.683120,0.551000,0.671002,0.600000
//   2,0.594411,0.702000,0.580112,0.720000
//
// Rows are written only after a run has finished training, like
// every other artifact.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

/// One row of metrics for a single training epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Mean class-weighted loss over the training batches
    pub train_loss: f64,

    /// Fraction of training samples classified correctly
    pub train_acc: f64,

    /// Mean unweighted loss on the validation split
    pub val_loss: f64,

    /// Fraction of validation samples classified correctly
    pub val_acc: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, train_acc: f64, val_loss: f64, val_acc: f64) -> Self {
        Self { epoch, train_loss, train_acc, val_loss, val_acc }
    }

    /// Returns true if this epoch improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,train_loss,train_acc,val_loss,val_acc")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append every epoch of a finished run.
    pub fn log_all(&self, history: &[EpochMetrics]) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        for m in history {
            writeln!(
                f,
                "{},{:.6},{:.6},{:.6},{:.6}",
                m.epoch, m.train_loss, m.train_acc, m.val_loss, m.val_acc,
            )?;
        }

        tracing::debug!("Logged {} epochs to '{}'", history.len(), self.csv_path.display());
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}
