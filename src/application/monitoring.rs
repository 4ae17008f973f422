use crate::domain::ports::{CacheStore, Matcher};
use crate::domain::{
    dataset::Dataset,
    search::{SearchRequest, SearchResult},
    value_objects::{KeyColumn, TableName},
};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{info, instrument};

// ─── PerfReport ──────────────────────────────────────────────────────────────

/// A single timed operation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OpTiming {
    /// Operation name: "load", "replace" or "search".
    pub operation: &'static str,
    /// Table this operation was performed on.
    pub table: String,
    /// Elapsed wall time in milliseconds.
    pub duration_ms: u128,
    /// Number of rows involved (read, written or scanned).
    pub rows: usize,
}

/// Accumulated performance timings for a single run.
///
/// Shared across all decorator instances for one run via `Arc<Mutex<_>>`.
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct PerfReport {
    pub timings: Vec<OpTiming>,
    pub total_rows_read: usize,
    pub total_rows_written: usize,
    pub total_ms: u128,
}

impl PerfReport {
    pub fn new() -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self::default()))
    }

    /// Copy out the current state of a shared report.
    pub fn snapshot(report: &Arc<Mutex<Self>>) -> Self {
        report.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn record(report: &Arc<Mutex<Self>>, timing: OpTiming) {
        if let Ok(mut r) = report.lock() {
            r.total_ms += timing.duration_ms;
            match timing.operation {
                "load" => r.total_rows_read += timing.rows,
                "replace" => r.total_rows_written += timing.rows,
                _ => {}
            }
            r.timings.push(timing);
        }
    }
}

// ─── MonitoringCacheStore ────────────────────────────────────────────────────

/// Decorator: wraps any `CacheStore`, measures wall time per `load` and
/// `replace` call, and appends the result to the shared `PerfReport`.
pub struct MonitoringCacheStore {
    inner: Arc<dyn CacheStore>,
    report: Arc<Mutex<PerfReport>>,
}

impl MonitoringCacheStore {
    pub fn new(inner: Arc<dyn CacheStore>, report: Arc<Mutex<PerfReport>>) -> Self {
        Self { inner, report }
    }
}

#[async_trait]
impl CacheStore for MonitoringCacheStore {
    #[instrument(
        name = "cache_load",
        skip(self, table),
        fields(db.table = %table.0),
        level = "info"
    )]
    async fn load(&self, table: &TableName) -> Result<Option<Dataset>> {
        let start = Instant::now();
        let dataset = self.inner.load(table).await?;
        let duration_ms = start.elapsed().as_millis();
        let rows = dataset.as_ref().map_or(0, Dataset::row_count);

        info!(table = %table.0, rows, hit = dataset.is_some(), duration_ms, "load completed");

        PerfReport::record(
            &self.report,
            OpTiming {
                operation: "load",
                table: table.0.clone(),
                duration_ms,
                rows,
            },
        );

        Ok(dataset)
    }

    #[instrument(
        name = "cache_replace",
        skip(self, table, dataset),
        fields(db.table = %table.0, rows = dataset.row_count()),
        level = "info"
    )]
    async fn replace(&self, table: &TableName, dataset: &Dataset) -> Result<()> {
        let start = Instant::now();
        self.inner.replace(table, dataset).await?;
        let duration_ms = start.elapsed().as_millis();

        info!(table = %table.0, rows = dataset.row_count(), duration_ms, "replace completed");

        PerfReport::record(
            &self.report,
            OpTiming {
                operation: "replace",
                table: table.0.clone(),
                duration_ms,
                rows: dataset.row_count(),
            },
        );

        Ok(())
    }
}

// ─── MonitoringMatcher ───────────────────────────────────────────────────────

/// Decorator: wraps any `Matcher`, measures wall time per `search` call,
/// and appends the result to the shared `PerfReport`.
pub struct MonitoringMatcher {
    inner: Arc<dyn Matcher>,
    report: Arc<Mutex<PerfReport>>,
}

impl MonitoringMatcher {
    pub fn new(inner: Arc<dyn Matcher>, report: Arc<Mutex<PerfReport>>) -> Self {
        Self { inner, report }
    }
}

impl Matcher for MonitoringMatcher {
    #[instrument(
        name = "search",
        skip(self, dataset, key, request, table),
        fields(
            db.table = %table.0,
            key.column = %key.name,
            rows = dataset.row_count(),
            keys = request.len(),
        ),
        level = "info"
    )]
    fn search(
        &self,
        dataset: &Dataset,
        key: &KeyColumn,
        request: &SearchRequest,
        table: &TableName,
    ) -> SearchResult {
        let start = Instant::now();
        let result = self.inner.search(dataset, key, request, table);
        let duration_ms = start.elapsed().as_millis();

        info!(
            table = %table.0,
            requested = request.len(),
            matched = result.matched.len(),
            not_found = result.not_found.len(),
            duration_ms,
            "search completed"
        );

        PerfReport::record(
            &self.report,
            OpTiming {
                operation: "search",
                table: table.0.clone(),
                duration_ms,
                rows: dataset.row_count(),
            },
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::search::KeyMatcher;
    use crate::domain::value_objects::ColumnName;
    use crate::infrastructure::store::memory::MemoryCacheStore;
    use serde_json::json;

    fn dataset() -> Dataset {
        Dataset::new(
            vec![ColumnName("sku".into())],
            vec![vec![json!("A1")], vec![json!("A2")]],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn store_decorator_records_reads_and_writes() {
        let report = PerfReport::new();
        let store = MonitoringCacheStore::new(Arc::new(MemoryCacheStore::new()), Arc::clone(&report));
        let table = TableName("inventory".into());

        assert!(store.load(&table).await.unwrap().is_none());
        store.replace(&table, &dataset()).await.unwrap();
        store.load(&table).await.unwrap();

        let perf = PerfReport::snapshot(&report);
        let ops: Vec<_> = perf.timings.iter().map(|t| t.operation).collect();
        assert_eq!(ops, vec!["load", "replace", "load"]);
        assert_eq!(perf.total_rows_written, 2);
        assert_eq!(perf.total_rows_read, 2);
    }

    #[test]
    fn matcher_decorator_passes_result_through() {
        let report = PerfReport::new();
        let matcher = MonitoringMatcher::new(Arc::new(KeyMatcher::new()), Arc::clone(&report));
        let key = KeyColumn {
            name: ColumnName("sku".into()),
            index: 0,
        };

        let result = matcher.search(
            &dataset(),
            &key,
            &SearchRequest::new(["a2", "zz"]),
            &TableName("inventory".into()),
        );

        assert_eq!(result.matched, vec![vec![json!("A2")]]);
        let perf = PerfReport::snapshot(&report);
        assert_eq!(perf.timings.len(), 1);
        assert_eq!(perf.timings[0].operation, "search");
        assert_eq!(perf.timings[0].rows, 2);
    }
}
