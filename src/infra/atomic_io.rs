// ============================================================
// Layer 6 — Atomic File Writes
// ============================================================
// Every artifact is written to a temporary file in the target
// directory, synced, then renamed over the final path. A crash or
// error mid-write leaves either the previous file or nothing,
// never a truncated artifact.

use anyhow::{Context, Result};
use std::{fs, io::Write, path::Path};
use tempfile::NamedTempFile;

pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .with_context(|| format!("Cannot create directory '{}'", parent.display()))?;

    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("Cannot create temp file in '{}'", parent.display()))?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Cannot move temp file to '{}'", path.display()))?;
    Ok(())
}

/// Copy `from` to `to` atomically, byte for byte.
pub fn atomic_copy(from: &Path, to: &Path) -> Result<()> {
    let bytes = fs::read(from)
        .with_context(|| format!("Cannot read '{}'", from.display()))?;
    atomic_write(to, &bytes)
}
