use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::domain::dataset::{cell_text, Row};
use crate::domain::ports::SheetTarget;

/// A local CSV file used as the destination sheet.
///
/// Rows may have different widths (marker rows hold a single cell), so the
/// file is written in flexible mode.
pub struct CsvSheet {
    path: PathBuf,
}

impl CsvSheet {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, rows: &[Row]) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(file);
        for row in rows {
            let record: Vec<String> = row
                .iter()
                .map(|cell| cell_text(cell).unwrap_or_default())
                .collect();
            writer
                .write_record(&record)
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[async_trait]
impl SheetTarget for CsvSheet {
    async fn clear(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        File::create(&self.path)
            .with_context(|| format!("Failed to truncate {}", self.path.display()))?;
        Ok(())
    }

    async fn append_row(&self, row: Row) -> Result<()> {
        self.write(std::slice::from_ref(&row))
    }

    async fn append_rows(&self, rows: Vec<Row>) -> Result<()> {
        self.write(&rows)
    }

    fn kind(&self) -> &'static str {
        "csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn clear_then_append_writes_ragged_rows() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = CsvSheet::new(dir.path().join("out/result.csv"));

        sheet.clear().await.unwrap();
        sheet
            .append_rows(vec![
                vec![json!("sku"), json!("qty")],
                vec![json!("A1"), json!(5)],
                vec![json!("B2"), Value::Null],
            ])
            .await
            .unwrap();
        sheet
            .append_row(vec![json!("❌ SKU not found: Z9")])
            .await
            .unwrap();

        let content = std::fs::read_to_string(sheet.path()).unwrap();
        assert_eq!(content, "sku,qty\nA1,5\nB2,\n❌ SKU not found: Z9\n");
    }

    #[tokio::test]
    async fn clear_discards_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = CsvSheet::new(dir.path().join("result.csv"));

        sheet.clear().await.unwrap();
        sheet.append_row(vec![json!("old")]).await.unwrap();
        sheet.clear().await.unwrap();
        sheet.append_row(vec![json!("new")]).await.unwrap();

        let content = std::fs::read_to_string(sheet.path()).unwrap();
        assert_eq!(content, "new\n");
    }
}
