use anyhow::Result;
use serde_json::Value;
use tracing::info;

use crate::domain::{
    dataset::Row,
    ports::SheetTarget,
    search::SearchResult,
    value_objects::ColumnName,
};

// ─────────────────────────────────────────────────────────────────────────────
// PublishService
// ─────────────────────────────────────────────────────────────────────────────

/// Writes a search result to a destination sheet.
///
/// The sheet is cleared first, then receives, in this order: the header, each
/// matched row as given, one marker row per missing key (`<prefix><key>`) in
/// the result's order. Nothing is reordered or deduplicated here.
pub struct PublishService {
    not_found_prefix: String,
}

impl PublishService {
    pub fn new(not_found_prefix: &str) -> Self {
        Self {
            not_found_prefix: not_found_prefix.to_string(),
        }
    }

    /// The rows a sheet holds after [`publish`](Self::publish).
    pub fn layout(&self, header: &[ColumnName], result: &SearchResult) -> Vec<Row> {
        let mut rows = Vec::with_capacity(1 + result.matched.len() + result.not_found.len());
        rows.push(header.iter().map(|c| Value::String(c.0.clone())).collect());
        rows.extend(result.matched.iter().cloned());
        rows.extend(
            result
                .not_found
                .iter()
                .map(|key| vec![Value::String(format!("{}{}", self.not_found_prefix, key))]),
        );
        rows
    }

    /// Replace the content of `target` with the result. Returns the number of
    /// rows written, header included.
    pub async fn publish(
        &self,
        target: &dyn SheetTarget,
        header: &[ColumnName],
        result: &SearchResult,
    ) -> Result<usize> {
        let rows = self.layout(header, result);
        let count = rows.len();

        target.clear().await?;
        target.append_rows(rows).await?;

        info!(
            target = target.kind(),
            rows = count,
            matched = result.matched.len(),
            not_found = result.not_found.len(),
            "result published"
        );
        Ok(count)
    }
}
