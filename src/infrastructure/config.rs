use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::key_column::DEFAULT_KEY_COLUMN;

/// Marker written for every requested key that matched no row.
pub const DEFAULT_NOT_FOUND_PREFIX: &str = "❌ SKU not found: ";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub target: TargetConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// SQLite database holding one table per imported file.
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
        }
    }
}

fn default_cache_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("skusync").join("data_gui.db"))
        .unwrap_or_else(|| PathBuf::from("data_gui.db"))
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Logical name of the identifier column, matched case-insensitively.
    #[serde(default = "default_key_column")]
    pub key_column: String,
    #[serde(default = "default_not_found_prefix")]
    pub not_found_prefix: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            key_column: default_key_column(),
            not_found_prefix: default_not_found_prefix(),
        }
    }
}

fn default_key_column() -> String {
    DEFAULT_KEY_COLUMN.to_string()
}

fn default_not_found_prefix() -> String {
    DEFAULT_NOT_FOUND_PREFIX.to_string()
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    #[default]
    GoogleSheets,
    Csv,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TargetConfig {
    /// Destination kind: "google_sheets" (default) or "csv".
    #[serde(default)]
    pub kind: TargetKind,
    /// Spreadsheet id (google_sheets) or output file path (csv).
    /// The `--target` flag overrides it.
    #[serde(default)]
    pub name: String,
    /// Worksheet title inside the spreadsheet.
    #[serde(default = "default_sheet")]
    pub sheet: String,
    /// Service-account JSON key file. When set, skusync mints its own
    /// spreadsheets-scoped access token and `token_env` is ignored.
    #[serde(default)]
    pub credentials: Option<PathBuf>,
    /// Environment variable holding a ready-made OAuth access token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            kind: TargetKind::default(),
            name: String::new(),
            sheet: default_sheet(),
            credentials: None,
            token_env: default_token_env(),
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_sheet() -> String {
    "Sheet1".to_string()
}

fn default_token_env() -> String {
    "GOOGLE_OAUTH_TOKEN".to_string()
}

fn default_api_base() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl AppConfig {
    /// Load the configuration.
    ///
    /// Layers, later wins: built-in defaults, the TOML file at `path` (when
    /// given, it must exist), then `SKUSYNC__<SECTION>__<KEY>` environment
    /// variables (e.g. `SKUSYNC__TARGET__NAME`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix("SKUSYNC")
                .prefix_separator("__")
                .separator("__"),
        );

        let cfg = builder.build().with_context(|| match path {
            Some(p) => format!("Failed to read config file: {}", p.display()),
            None => "Failed to read configuration from environment".to_string(),
        })?;
        cfg.try_deserialize()
            .with_context(|| "Failed to parse configuration")
    }
}
