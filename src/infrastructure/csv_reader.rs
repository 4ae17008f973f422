use anyhow::{bail, Context, Result};
use serde_json::{Number, Value};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::domain::dataset::{Dataset, Row};
use crate::domain::value_objects::{ColumnName, TableName};

/// Logical table name of a source file: its base name without extension.
///
/// `/data/Stock List.csv` → `Stock List`
pub fn logical_table_name(path: &Path) -> Result<TableName> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .with_context(|| format!("Cannot derive a table name from {}", path.display()))?;
    Ok(TableName(stem.to_string()))
}

/// Read a CSV file (first record = header) into a [`Dataset`].
pub fn read_csv(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let dataset =
        parse_csv(file).with_context(|| format!("Failed to parse {}", path.display()))?;
    debug!(
        path = %path.display(),
        columns = dataset.columns().len(),
        rows = dataset.row_count(),
        "CSV loaded"
    );
    Ok(dataset)
}

/// Parse CSV content into a [`Dataset`].
///
/// # Behavior
/// - Duplicate header names get a `.1`, `.2`… suffix; blank ones become
///   `Unnamed: <position>`.
/// - Rows shorter than the header are padded with nulls; longer rows are an
///   error.
/// - Column types are inferred (see [`infer_column`]); empty cells are null.
pub fn parse_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let raw_headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(str::to_string)
        .collect();

    if raw_headers.is_empty() || raw_headers.iter().all(|h| h.trim().is_empty()) {
        bail!("CSV file has no header row");
    }

    let columns = dedupe_headers(&raw_headers);
    let width = columns.len();

    let mut text_rows: Vec<Vec<Option<String>>> = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV record {}", line + 2))?;
        if record.len() > width {
            bail!(
                "CSV record {} has {} fields, header has {}",
                line + 2,
                record.len(),
                width
            );
        }
        let mut cells: Vec<Option<String>> = record
            .iter()
            .map(|s| if s.is_empty() { None } else { Some(s.to_string()) })
            .collect();
        cells.resize(width, None);
        text_rows.push(cells);
    }

    let typed_columns: Vec<Vec<Value>> = (0..width)
        .map(|idx| infer_column(text_rows.iter().map(|r| r[idx].as_deref())))
        .collect();

    let rows: Vec<Row> = (0..text_rows.len())
        .map(|r| typed_columns.iter().map(|col| col[r].clone()).collect())
        .collect();

    Dataset::new(columns, rows)
}

/// Column names are compared case-insensitively, as SQLite does.
fn dedupe_headers(raw: &[String]) -> Vec<ColumnName> {
    let mut seen: HashSet<String> = HashSet::new();
    raw.iter()
        .enumerate()
        .map(|(idx, name)| {
            let base = if name.trim().is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                name.clone()
            };
            let mut candidate = base.clone();
            let mut n = 1;
            while !seen.insert(candidate.to_lowercase()) {
                candidate = format!("{}.{}", base, n);
                n += 1;
            }
            ColumnName(candidate)
        })
        .collect()
}

/// Type one column from its text cells.
///
/// Every non-empty cell parses as `i64` → integers; as finite `f64` →
/// floats; otherwise text. A numeric cell with a leading zero (`007`) keeps
/// the column textual so identifiers survive unchanged. `-0.0` is read as
/// `0.0`, which is what SQLite stores.
fn infer_column<'a, I>(cells: I) -> Vec<Value>
where
    I: Iterator<Item = Option<&'a str>> + Clone,
{
    let present = || cells.clone().flatten().map(str::trim);

    let all_int = present().all(|s| s.parse::<i64>().is_ok() && !has_leading_zero(s));
    let all_float = present().all(|s| {
        s.parse::<f64>().map(f64::is_finite).unwrap_or(false) && !has_leading_zero(s)
    });

    cells
        .map(|cell| match cell {
            None => Value::Null,
            Some(s) if all_int => s.trim().parse::<i64>().map_or(Value::Null, Value::from),
            Some(s) if all_float => s
                .trim()
                .parse::<f64>()
                .ok()
                .map(|f| if f == 0.0 { 0.0 } else { f })
                .and_then(Number::from_f64)
                .map_or(Value::Null, Value::Number),
            Some(s) => Value::String(s.to_string()),
        })
        .collect()
}

fn has_leading_zero(s: &str) -> bool {
    let digits = s.trim_start_matches(['-', '+']);
    digits.len() > 1 && digits.starts_with('0') && !digits.starts_with("0.")
}
