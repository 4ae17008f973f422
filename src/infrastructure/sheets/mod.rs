use anyhow::{Context, Result};

use crate::domain::ports::SheetTarget;
use crate::infrastructure::config::{TargetConfig, TargetKind};

use self::csv_file::CsvSheet;
use self::google::{service_account_token, GoogleSheet};

pub mod csv_file;
pub mod google;
pub mod memory;

/// Build the destination sheet named `name` (spreadsheet id or CSV path)
/// according to the configured target kind.
///
/// Google Sheets authenticates with the `credentials` key file when one is
/// configured, otherwise with the token in `$<token_env>`.
pub async fn target_for(cfg: &TargetConfig, name: &str) -> Result<Box<dyn SheetTarget>> {
    match cfg.kind {
        TargetKind::GoogleSheets => {
            let token = match &cfg.credentials {
                Some(key_file) => service_account_token(key_file).await?,
                None => std::env::var(&cfg.token_env).with_context(|| {
                    format!(
                        "No Google credentials: set [target] credentials or export ${}",
                        cfg.token_env
                    )
                })?,
            };
            Ok(Box::new(GoogleSheet::new(cfg, name, token)?))
        }
        TargetKind::Csv => Ok(Box::new(CsvSheet::new(name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn csv_target_needs_no_credentials() {
        let cfg = TargetConfig {
            kind: TargetKind::Csv,
            ..TargetConfig::default()
        };
        let target = target_for(&cfg, "out.csv").await.unwrap();
        assert_eq!(target.kind(), "csv");
    }

    #[tokio::test]
    async fn google_target_requires_token_variable() {
        let cfg = TargetConfig {
            kind: TargetKind::GoogleSheets,
            token_env: "SKUSYNC_TEST_TOKEN_THAT_IS_NEVER_SET".into(),
            ..TargetConfig::default()
        };
        let err = target_for(&cfg, "abc123").await.err().unwrap();
        assert!(
            err.to_string().contains("SKUSYNC_TEST_TOKEN_THAT_IS_NEVER_SET"),
            "got: {err}"
        );
    }

    #[tokio::test]
    async fn key_file_takes_precedence_over_token_variable() {
        let cfg = TargetConfig {
            kind: TargetKind::GoogleSheets,
            credentials: Some("/nonexistent/sa-key.json".into()),
            token_env: "PATH".into(),
            ..TargetConfig::default()
        };
        let err = target_for(&cfg, "abc123").await.err().unwrap();
        assert!(err.to_string().contains("sa-key.json"), "got: {err}");
    }
}
