use crate::flatten::FlatRecord;
use serde_json::Value;

/// An in-memory table of rows reindexed onto a fixed column order
///
/// Built once per export call and discarded after the append completes.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Project flat records onto a fixed column list
    ///
    /// Record keys absent from `columns` are silently dropped; columns absent
    /// from a record become null. Row order equals record order.
    pub fn project(records: &[FlatRecord], columns: &[&str]) -> Self {
        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|&column| record.get(column).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Table {
            columns: columns.iter().map(|&c| c.to_string()).collect(),
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rebuild the flat records this table holds, one per row
    pub fn to_records(&self) -> Vec<FlatRecord> {
        self.rows
            .iter()
            .map(|row| {
                let mut record = FlatRecord::new();
                for (column, value) in self.columns.iter().zip(row.iter()) {
                    record.insert(column.clone(), value.clone());
                }
                record
            })
            .collect()
    }
}
