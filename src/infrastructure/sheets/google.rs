use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::domain::dataset::Row;
use crate::domain::ports::SheetTarget;
use crate::infrastructure::config::TargetConfig;

#[derive(Serialize)]
struct ValueRange<'a> {
    values: &'a [Vec<Value>],
}

const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Exchange a service-account JSON key for a spreadsheets-scoped access token.
///
/// The spreadsheet must be shared with the service account's email.
pub async fn service_account_token(key_file: &Path) -> Result<String> {
    let key = yup_oauth2::read_service_account_key(key_file)
        .await
        .with_context(|| format!("Failed to read service-account key {}", key_file.display()))?;
    let client_email = key.client_email.clone();

    let auth = yup_oauth2::ServiceAccountAuthenticator::builder(key)
        .build()
        .await
        .context("Failed to set up service-account authentication")?;
    let token = auth
        .token(&[SPREADSHEETS_SCOPE])
        .await
        .with_context(|| format!("Failed to obtain an access token for {}", client_email))?;

    debug!(account = %client_email, "service-account token obtained");
    token
        .token()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Token endpoint returned no access token for {}", client_email))
}

/// A worksheet of a Google spreadsheet, written through the Sheets v4 REST API.
///
/// Addressed by spreadsheet id. The bearer token comes from
/// [`service_account_token`] or from the environment (see `target_for`).
pub struct GoogleSheet {
    client: reqwest::Client,
    api_base: String,
    spreadsheet_id: String,
    sheet: String,
    token: String,
}

impl GoogleSheet {
    pub fn new(cfg: &TargetConfig, spreadsheet_id: &str, token: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_base: cfg.api_base.clone(),
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet: cfg.sheet.clone(),
            token,
        })
    }

    /// `<api_base>/v4/spreadsheets/<id>/values/'<sheet>'<action>`
    fn values_url(&self, action: &str) -> Result<Url> {
        let mut url = Url::parse(&self.api_base)
            .with_context(|| format!("Invalid Sheets API base URL: {}", self.api_base))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Sheets API base URL cannot take a path: {}", self.api_base))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values"])
            .push(&format!("{}{}", a1_sheet_range(&self.sheet), action));
        Ok(url)
    }

    async fn post(&self, url: Url, body: &impl Serialize, what: &str) -> Result<()> {
        debug!(%url, "Sheets API request");
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .with_context(|| format!("{} request to Google Sheets failed", what))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read body>".to_string());
            bail!("Google Sheets {} returned {}: {}", what, status, body.trim());
        }
        Ok(())
    }
}

/// Quote a sheet title for A1 notation: `'Sheet 1'`, embedded quotes doubled.
fn a1_sheet_range(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

/// Sheets cells cannot hold JSON null; an empty string leaves the cell blank.
fn sheet_cell(cell: Value) -> Value {
    match cell {
        Value::Null => Value::String(String::new()),
        other => other,
    }
}

#[async_trait]
impl SheetTarget for GoogleSheet {
    async fn clear(&self) -> Result<()> {
        let url = self.values_url(":clear")?;
        self.post(url, &serde_json::json!({}), "clear").await?;
        info!(spreadsheet = %self.spreadsheet_id, sheet = %self.sheet, "sheet cleared");
        Ok(())
    }

    async fn append_row(&self, row: Row) -> Result<()> {
        self.append_rows(vec![row]).await
    }

    async fn append_rows(&self, rows: Vec<Row>) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let count = rows.len();
        let values: Vec<Vec<Value>> = rows
            .into_iter()
            .map(|r| r.into_iter().map(sheet_cell).collect())
            .collect();

        let mut url = self.values_url(":append")?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        self.post(url, &ValueRange { values: &values }, "append")
            .await?;
        info!(spreadsheet = %self.spreadsheet_id, rows = count, "rows appended");
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "google_sheets"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::publish::PublishService;
    use crate::domain::search::SearchResult;
    use crate::domain::value_objects::ColumnName;
    use crate::infrastructure::config::DEFAULT_NOT_FOUND_PREFIX;
    use mockito::Matcher;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn sheet(name: &str) -> GoogleSheet {
        let cfg = TargetConfig {
            sheet: name.to_string(),
            ..TargetConfig::default()
        };
        GoogleSheet::new(&cfg, "abc123", "token".into()).unwrap()
    }

    #[test]
    fn test_values_url_clear() {
        let url = sheet("Sheet1").values_url(":clear").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/'Sheet1':clear"
        );
    }

    #[test]
    fn test_values_url_encodes_sheet_title() {
        let url = sheet("Stock 2024").values_url(":append").unwrap();
        assert!(
            url.as_str().ends_with("/values/'Stock%202024':append"),
            "got: {url}"
        );
    }

    #[test]
    fn test_a1_sheet_range_doubles_quotes() {
        assert_eq!(a1_sheet_range("Bob's"), "'Bob''s'");
    }

    #[test]
    fn test_sheet_cell_blanks_nulls() {
        assert_eq!(sheet_cell(Value::Null), json!(""));
        assert_eq!(sheet_cell(json!(5)), json!(5));
    }

    fn mock_sheet(server: &mockito::ServerGuard) -> GoogleSheet {
        let cfg = TargetConfig {
            api_base: server.url(),
            timeout_secs: 5,
            ..TargetConfig::default()
        };
        GoogleSheet::new(&cfg, "sheet-id", "test-token".into()).unwrap()
    }

    fn append_query() -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("valueInputOption".into(), "RAW".into()),
            Matcher::UrlEncoded("insertDataOption".into(), "INSERT_ROWS".into()),
        ])
    }

    #[tokio::test]
    async fn test_publish_clears_then_appends_layout_in_one_request() {
        let mut server = mockito::Server::new_async().await;
        let clear = server
            .mock("POST", "/v4/spreadsheets/sheet-id/values/'Sheet1':clear")
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;
        let append = server
            .mock(
                "POST",
                Matcher::Regex("^/v4/spreadsheets/sheet-id/values/'Sheet1':append".into()),
            )
            .match_header("authorization", "Bearer test-token")
            .match_query(append_query())
            .match_body(Matcher::Json(json!({
                "values": [
                    ["sku", "qty"],
                    ["A1", 5],
                    ["A3", 12],
                    ["❌ SKU not found: Z9"]
                ]
            })))
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let result = SearchResult {
            matched: vec![vec![json!("A1"), json!(5)], vec![json!("A3"), json!(12)]],
            not_found: BTreeSet::from(["Z9".to_string()]),
        };
        let header = vec![ColumnName("sku".into()), ColumnName("qty".into())];
        let written = PublishService::new(DEFAULT_NOT_FOUND_PREFIX)
            .publish(&mock_sheet(&server), &header, &result)
            .await
            .unwrap();

        assert_eq!(written, 4);
        clear.assert_async().await;
        append.assert_async().await;
    }

    #[tokio::test]
    async fn test_append_sends_nulls_as_blank_cells() {
        let mut server = mockito::Server::new_async().await;
        let append = server
            .mock(
                "POST",
                Matcher::Regex("^/v4/spreadsheets/sheet-id/values/'Sheet1':append".into()),
            )
            .match_query(append_query())
            .match_body(Matcher::Json(json!({ "values": [["A2", ""]] })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        mock_sheet(&server)
            .append_row(vec![json!("A2"), Value::Null])
            .await
            .unwrap();

        append.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_clear_carries_response_body_and_skips_append() {
        let mut server = mockito::Server::new_async().await;
        let clear = server
            .mock("POST", "/v4/spreadsheets/sheet-id/values/'Sheet1':clear")
            .with_status(403)
            .with_body(r#"{"error":{"status":"PERMISSION_DENIED"}}"#)
            .create_async()
            .await;
        let append = server
            .mock("POST", Matcher::Regex(":append".into()))
            .expect(0)
            .create_async()
            .await;

        let result = SearchResult {
            matched: vec![],
            not_found: BTreeSet::new(),
        };
        let err = PublishService::new(DEFAULT_NOT_FOUND_PREFIX)
            .publish(&mock_sheet(&server), &[ColumnName("sku".into())], &result)
            .await
            .unwrap_err();

        let msg = format!("{err:#}");
        assert!(msg.contains("403"), "got: {msg}");
        assert!(msg.contains("PERMISSION_DENIED"), "got: {msg}");
        clear.assert_async().await;
        append.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_service_account_key_names_the_file() {
        let err = service_account_token(Path::new("/nonexistent/sa-key.json"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("sa-key.json"), "got: {err}");
    }

    #[tokio::test]
    async fn test_malformed_service_account_key_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"{\"type\": \"service_account\"}").unwrap();
        assert!(service_account_token(file.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_api_is_an_error() {
        let cfg = TargetConfig {
            api_base: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..TargetConfig::default()
        };
        let sheet = GoogleSheet::new(&cfg, "abc123", "token".into()).unwrap();
        let err = sheet.clear().await.unwrap_err();
        assert!(err.to_string().contains("clear"), "got: {err}");
    }
}
