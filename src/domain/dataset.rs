use anyhow::{bail, Result};
use serde::Serialize;
use serde_json::Value;

use crate::domain::value_objects::ColumnName;

/// A single row: one scalar cell per column, aligned to [`Dataset::columns`].
///
/// Cells are `Value::String`, `Value::Number` or `Value::Null`.
pub type Row = Vec<Value>;

/// An imported table: ordered column names plus ordered rows.
///
/// Row position is part of the dataset's identity (see
/// [`crate::domain::fingerprint::fingerprint`]).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    columns: Vec<ColumnName>,
    rows: Vec<Row>,
}

impl Dataset {
    /// Build a dataset, rejecting any row whose width differs from the header.
    pub fn new(columns: Vec<ColumnName>, rows: Vec<Row>) -> Result<Self> {
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != columns.len())
        {
            bail!(
                "row {} has {} cell(s), expected {}",
                idx,
                row.len(),
                columns.len()
            );
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[ColumnName] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.0.clone()).collect()
    }
}

/// Text form of a cell, the way it is compared against requested keys.
///
/// Strings are returned as-is, numbers in their JSON spelling (`5`, `5.5`),
/// `None` for nulls.
pub fn cell_text(cell: &Value) -> Option<String> {
    match cell {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cols(names: &[&str]) -> Vec<ColumnName> {
        names.iter().map(|n| ColumnName(n.to_string())).collect()
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = Dataset::new(cols(&["sku", "qty"]), vec![vec![json!("A1")]]).unwrap_err();
        assert!(err.to_string().contains("expected 2"), "got: {err}");
    }

    #[test]
    fn empty_dataset_keeps_header() {
        let ds = Dataset::new(cols(&["sku"]), vec![]).unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.column_names(), vec!["sku".to_string()]);
    }

    #[test]
    fn cell_text_spells_numbers_like_json() {
        assert_eq!(cell_text(&json!("A1")), Some("A1".to_string()));
        assert_eq!(cell_text(&json!(5)), Some("5".to_string()));
        assert_eq!(cell_text(&json!(5.0)), Some("5.0".to_string()));
        assert_eq!(cell_text(&Value::Null), None);
    }
}
