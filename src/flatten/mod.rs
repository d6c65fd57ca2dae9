//! Observation flattening - extract nested observation JSON into flat records
//!
//! This module handles the extraction of nested iNaturalist observation
//! structures into flat field-to-value mappings suitable for tabular export.
//!
//! ## Failure Isolation
//!
//! A malformed observation never aborts a batch: `flatten_batch` logs the
//! failure and drops that record while the rest of the input is processed
//! in order.

pub mod types;
pub mod extractor;

pub use types::{FlatRecord, FlattenError};
pub use extractor::ObservationFlattener;
