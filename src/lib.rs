use std::sync::{Arc, Mutex};

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
#[cfg(feature = "cli")]
pub mod presentation;

// ─── Log level ────────────────────────────────────────────────────────────────

/// Controls the verbosity of skusync's internal tracing output.
///
/// Pass to [`init_tracing`] before calling any async entry point.
///
/// | Variant | `tracing` level | When to use                            |
/// |---------|-----------------|----------------------------------------|
/// | `Error` | `error`         | `--quiet` / scripting                  |
/// | `Info`  | `info`          | Default: import outcome and timings    |
/// | `Debug` | `debug`         | `--verbose`: SQL and HTTP calls too    |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    #[default]
    Info,
    Debug,
}

/// Initialise the global `tracing` subscriber for skusync.
///
/// Respects `RUST_LOG` when set, falling back to `level` otherwise. Call
/// this once at startup. Library consumers who manage their own subscriber
/// should skip it.
///
/// Only available when the `cli` feature is enabled (pulls in
/// `tracing-subscriber`).
#[cfg(feature = "cli")]
pub fn init_tracing(level: LogLevel) {
    use tracing_subscriber::fmt::format::FmtSpan;

    let default_filter = match level {
        LogLevel::Error => "skusync=error",
        LogLevel::Info => "skusync=info",
        LogLevel::Debug => "skusync=debug",
    };

    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

// ─── Public API Facade ───

pub use application::monitoring::PerfReport;
pub use application::pipeline::{Pipeline, RunReport, SearchCommand};
pub use domain::dataset::{Dataset, Row};
pub use domain::fingerprint::fingerprint;
pub use domain::import_outcome::ImportOutcome;
pub use domain::key_column::resolve_key_column;
pub use domain::ports::{CacheStore, Matcher, SheetTarget};
pub use domain::search::{SearchRequest, SearchResult};
pub use domain::value_objects::{ColumnName, Fingerprint, KeyColumn, TableName};
pub use error::PipelineError;
pub use infrastructure::config::{AppConfig, CacheConfig, SearchConfig, TargetConfig, TargetKind};

use crate::application::monitoring::{MonitoringCacheStore, MonitoringMatcher};
use crate::application::search::KeyMatcher;
use crate::infrastructure::sheets::target_for;
use crate::infrastructure::store::sqlite::connect;

// ─── Public entry points ───

/// Import, search and publish to the target configured in `cfg`.
///
/// The destination is built after the search, so a missing token or an
/// unreachable sheet is reported as [`PipelineError::Publish`] while the
/// cache import stays in place.
pub async fn run(cfg: &AppConfig, command: &SearchCommand) -> Result<RunReport, PipelineError> {
    let (pipeline, report) = build_pipeline(cfg).await?;
    let mut run = pipeline.search(command).await?;

    let target = target_for(&cfg.target, &command.target_name)
        .await
        .map_err(PipelineError::Publish)?;
    pipeline.publish(target.as_ref(), &mut run).await?;

    run.perf = Some(PerfReport::snapshot(&report));
    Ok(run)
}

/// Like [`run`] but writes to a caller-supplied destination.
pub async fn run_with_target(
    cfg: &AppConfig,
    command: &SearchCommand,
    target: &dyn SheetTarget,
) -> Result<RunReport, PipelineError> {
    let (pipeline, report) = build_pipeline(cfg).await?;
    let mut run = pipeline.execute(command, target).await?;
    run.perf = Some(PerfReport::snapshot(&report));
    Ok(run)
}

/// Import and search without publishing anything.
pub async fn run_dry(cfg: &AppConfig, command: &SearchCommand) -> Result<RunReport, PipelineError> {
    let (pipeline, report) = build_pipeline(cfg).await?;
    let mut run = pipeline.search(command).await?;
    run.perf = Some(PerfReport::snapshot(&report));
    Ok(run)
}

/// Rows the destination holds after publishing `run`.
pub fn layout(cfg: &AppConfig, run: &RunReport) -> Vec<Row> {
    application::publish::PublishService::new(&cfg.search.not_found_prefix)
        .layout(&run.header, &run.result)
}

// ─── Private helpers ───────────────────────────────────────────────────────────

/// Open the cache and wire the monitoring decorators around the store and
/// the matcher. Both share one `PerfReport` for the run.
async fn build_pipeline(
    cfg: &AppConfig,
) -> Result<(Pipeline, Arc<Mutex<PerfReport>>), PipelineError> {
    let report = PerfReport::new();

    let store = Arc::new(connect(&cfg.cache).await.map_err(PipelineError::Import)?);
    let store = Arc::new(MonitoringCacheStore::new(store, Arc::clone(&report)));
    let matcher = Arc::new(MonitoringMatcher::new(
        Arc::new(KeyMatcher::new()),
        Arc::clone(&report),
    ));

    Ok((Pipeline::new(store, matcher, &cfg.search), report))
}
