//! Append-mode CSV serialization of a projected table.
//!
//! One row per record, no row-index column. Quoting of embedded commas,
//! quotes and newlines is handled by the `csv` crate.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs::OpenOptions;
use std::path::Path;

use crate::schema::Table;

/// Append a projected table to a CSV file, creating the file if missing
///
/// The header row is written on every call. I/O failures propagate to the
/// caller; no partial-write recovery is attempted. The caller must serialize
/// concurrent exports to the same target.
pub fn append_csv<P: AsRef<Path>>(path: P, table: &Table) -> Result<()> {
    let path = path.as_ref();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open output file: {}", path.display()))?;

    let mut writer = csv::Writer::from_writer(file);

    writer
        .write_record(table.columns())
        .context("Failed to write header row")?;

    for row in table.rows() {
        writer
            .write_record(row.iter().map(cell_text))
            .context("Failed to write row")?;
    }

    writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}

/// Render a JSON value as a CSV cell: null is empty, strings are unquoted
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
