//! Schema projection - fixed canonical columns and row reindexing
//!
//! Projection is the single place where an omitted flat-record key becomes an
//! explicit null, and where dynamic custom-field columns outside the fixed
//! whitelist are dropped.

pub mod columns;
pub mod projector;

pub use columns::CANONICAL_COLUMNS;
pub use projector::Table;
