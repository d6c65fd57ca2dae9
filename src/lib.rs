//! # inat_export - Observation Flattening and CSV Export
//!
//! A library for flattening deeply nested iNaturalist observation records
//! into a flat, fixed-schema table and appending it to a CSV file.
//!
//! ## Modules
//!
//! - **flatten**: Extract nested observation JSON into flat records, with
//!   per-record failure isolation
//! - **schema**: The canonical column list and the projection onto it
//! - **export**: Append-mode CSV serialization and output-path construction
//!
//! ## Quick Start
//!
//! ```rust
//! use inat_export::{ObservationFlattener, Table, CANONICAL_COLUMNS};
//! use serde_json::json;
//!
//! let observation = json!({
//!     "id": 41234567,
//!     "created_time_zone": "Eastern Time (US & Canada)",
//!     "obscured": false,
//!     "captive": false,
//!     "license_code": "CC-BY-NC",
//!     "taxon": {"id": 4956, "name": "Grus americana"},
//!     "user": {"id": 77, "login": "craner"},
//!     "geojson": {"type": "Point", "coordinates": [-80.1, 25.8]},
//!     "sounds": [],
//!     "tags": ["wetland"],
//!     "identifications": [],
//!     "project_observations": [
//!         {"preferences": {"allows_curator_coordinate_access": true}}
//!     ],
//!     "ofvs": [{"name": "Count", "value": "3"}]
//! });
//!
//! let flattener = ObservationFlattener::new();
//! let records = flattener.flatten_batch(&[observation]);
//! assert_eq!(records.len(), 1);
//!
//! let table = Table::project(&records, &CANONICAL_COLUMNS);
//! assert_eq!(table.rows()[0].len(), CANONICAL_COLUMNS.len());
//! ```

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

pub mod export;
pub mod flatten;
pub mod schema;

// Re-export commonly used types for convenience
pub use export::{append_csv, build_export_path};
pub use flatten::{FlatRecord, FlattenError, ObservationFlattener};
pub use schema::{Table, CANONICAL_COLUMNS};

/// Main entry point: flatten observations and append them to a CSV file
///
/// Malformed observations are logged and dropped; everything else is
/// projected onto [`CANONICAL_COLUMNS`] and appended to `path`. Returns the
/// number of rows written.
pub fn export_observations<P: AsRef<Path>>(path: P, observations: &[Value]) -> Result<usize> {
    let path = path.as_ref();
    let flattener = ObservationFlattener::new();

    let records = flattener.flatten_batch(observations);
    let table = Table::project(&records, &CANONICAL_COLUMNS);

    append_csv(path, &table)
        .with_context(|| format!("Failed to export observations to {}", path.display()))?;

    Ok(table.row_count())
}
