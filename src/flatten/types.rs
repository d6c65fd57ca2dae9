use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A flattened observation - represents one row before schema projection
///
/// Keys are either fixed field names (e.g. `scientific_name`) or dynamic
/// custom-field columns of the form `field:<lowercased name>`. A key that is
/// absent becomes null once the record is projected onto the canonical
/// column list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatRecord {
    fields: Map<String, Value>,
}

impl FlatRecord {
    pub fn new() -> Self {
        FlatRecord { fields: Map::new() }
    }

    /// Set a column value, replacing any previous value for the same column
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.fields.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    /// Iterate over the populated column names
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Why a single observation could not be flattened
///
/// Carries the JSON path of the offending field so a dropped record can be
/// diagnosed from the log alone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlattenError {
    /// A required field (or sequence element) is absent
    #[error("missing required field '{path}'")]
    MissingField { path: String },

    /// A field is present but has an unusable shape
    #[error("field '{path}' has the wrong type (expected {expected})")]
    WrongType { path: String, expected: &'static str },
}

impl FlattenError {
    pub fn missing(path: impl Into<String>) -> Self {
        FlattenError::MissingField { path: path.into() }
    }

    pub fn wrong_type(path: impl Into<String>, expected: &'static str) -> Self {
        FlattenError::WrongType {
            path: path.into(),
            expected,
        }
    }
}
