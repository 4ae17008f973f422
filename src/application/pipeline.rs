use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::cache::TableCache;
use crate::application::monitoring::PerfReport;
use crate::application::publish::PublishService;
use crate::domain::{
    import_outcome::ImportOutcome,
    key_column::resolve_key_column,
    ports::{CacheStore, Matcher, SheetTarget},
    search::{SearchRequest, SearchResult},
    value_objects::{ColumnName, TableName},
};
use crate::error::PipelineError;
use crate::infrastructure::config::SearchConfig;
use crate::infrastructure::csv_reader::{logical_table_name, read_csv};

// ─────────────────────────────────────────────────────────────────────────────
// SearchCommand
// ─────────────────────────────────────────────────────────────────────────────

/// Validated user input for one run.
#[derive(Debug, Clone)]
pub struct SearchCommand {
    pub csv_path: PathBuf,
    /// Spreadsheet id or output path, depending on the target kind.
    pub target_name: String,
    pub request: SearchRequest,
}

impl SearchCommand {
    /// Validate raw input. `keys` is a comma-separated list.
    ///
    /// Every field must be filled in. A key list made only of separators
    /// (`", ,"`) is accepted and yields an empty request.
    pub fn new(csv_path: &str, target_name: &str, keys: &str) -> Result<Self, PipelineError> {
        let mut missing = Vec::new();
        if csv_path.trim().is_empty() {
            missing.push("CSV file path");
        }
        if target_name.trim().is_empty() {
            missing.push("target name");
        }
        if keys.trim().is_empty() {
            missing.push("key list");
        }
        if !missing.is_empty() {
            return Err(PipelineError::Validation(format!(
                "Please fill in all fields (missing: {})",
                missing.join(", ")
            )));
        }

        Ok(Self {
            csv_path: PathBuf::from(csv_path.trim()),
            target_name: target_name.trim().to_string(),
            request: SearchRequest::parse(keys),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RunReport
// ─────────────────────────────────────────────────────────────────────────────

/// Everything a run produced, for display and for the JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub created_at: String,
    pub table: TableName,
    pub import: ImportOutcome,
    pub header: Vec<ColumnName>,
    pub key_column: ColumnName,
    pub requested: usize,
    pub result: SearchResult,
    /// Destination kind the result was written to; `None` for dry runs.
    pub published_to: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perf: Option<PerfReport>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline
// ─────────────────────────────────────────────────────────────────────────────

/// Read → import → resolve key → search, then optionally publish.
///
/// A publish failure leaves the cache import in place.
pub struct Pipeline {
    cache: TableCache,
    matcher: Arc<dyn Matcher>,
    publisher: PublishService,
    key_column: String,
}

impl Pipeline {
    pub fn new(store: Arc<dyn CacheStore>, matcher: Arc<dyn Matcher>, search: &SearchConfig) -> Self {
        Self {
            cache: TableCache::new(store),
            matcher,
            publisher: PublishService::new(&search.not_found_prefix),
            key_column: search.key_column.clone(),
        }
    }

    /// Import the CSV file and search the cached table.
    #[instrument(name = "run_search", skip(self, command), fields(csv = %command.csv_path.display()))]
    pub async fn search(&self, command: &SearchCommand) -> Result<RunReport, PipelineError> {
        let table = logical_table_name(&command.csv_path).map_err(PipelineError::Import)?;
        let dataset = read_csv(&command.csv_path).map_err(PipelineError::Import)?;

        let import = self
            .cache
            .import_if_changed(&table, &dataset)
            .await
            .map_err(PipelineError::Import)?;

        let cached = self
            .cache
            .load(&table)
            .await
            .map_err(PipelineError::Import)?
            .ok_or_else(|| {
                PipelineError::Import(anyhow::anyhow!(
                    "Cached table {} disappeared after import",
                    table
                ))
            })?;

        let key = resolve_key_column(cached.columns(), &self.key_column).ok_or_else(|| {
            PipelineError::KeyColumnNotFound {
                table: table.0.clone(),
                key: self.key_column.clone(),
                columns: cached.column_names().join(", "),
            }
        })?;

        let result = self.matcher.search(&cached, &key, &command.request, &table);

        info!(
            table = %table,
            import = import.label(),
            matched = result.matched.len(),
            not_found = result.not_found.len(),
            "search finished"
        );

        Ok(RunReport {
            run_id: format!(
                "run_{}_{}",
                Utc::now().format("%Y%m%d_%H%M%S"),
                Uuid::new_v4().simple()
            ),
            created_at: Utc::now().to_rfc3339(),
            table,
            import,
            header: cached.columns().to_vec(),
            key_column: key.name,
            requested: command.request.len(),
            result,
            published_to: None,
            perf: None,
        })
    }

    /// Write a finished search to `target`.
    pub async fn publish(
        &self,
        target: &dyn SheetTarget,
        report: &mut RunReport,
    ) -> Result<(), PipelineError> {
        self.publisher
            .publish(target, &report.header, &report.result)
            .await
            .map_err(PipelineError::Publish)?;
        report.published_to = Some(target.kind());
        Ok(())
    }

    /// Search, then publish to `target`.
    pub async fn execute(
        &self,
        command: &SearchCommand,
        target: &dyn SheetTarget,
    ) -> Result<RunReport, PipelineError> {
        let mut report = self.search(command).await?;
        self.publish(target, &mut report).await?;
        Ok(report)
    }
}
