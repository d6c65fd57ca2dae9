//! CSV export - append projected tables to a delimited output file
//!
//! The writer appends: successive export calls against the same target
//! accumulate rows (each call re-emits the header row, so callers normally
//! pair an export with a fresh path from [`build_export_path`]).

pub mod csv;

pub use self::csv::append_csv;

use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

/// Build a timestamped output path for a project, creating the directory
///
/// Returns `<output_dir>/<slug>.<YYYY-MM-DD-HH-MM-SS>.csv`. A pre-existing
/// file of the same name is removed; the timestamp makes that unlikely.
pub fn build_export_path(output_dir: impl AsRef<Path>, slug: &str) -> Result<PathBuf> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir).with_context(|| {
        format!("Failed to create output directory: {}", output_dir.display())
    })?;

    let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
    let path = output_dir.join(format!("{slug}.{timestamp}.csv"));

    if path.exists() {
        fs::remove_file(&path)
            .with_context(|| format!("Failed to remove stale output file: {}", path.display()))?;
    }

    Ok(path)
}
