use crate::domain::{
    dataset::{Dataset, Row},
    search::{SearchRequest, SearchResult},
    value_objects::{KeyColumn, TableName},
};
use anyhow::Result;
use async_trait::async_trait;

/// Port: persisted table cache (implemented by SqliteCacheStore, MemoryCacheStore)
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read the cached snapshot for `table`, or `None` if it was never imported.
    async fn load(&self, table: &TableName) -> Result<Option<Dataset>>;

    /// Replace the cached snapshot for `table` wholesale.
    ///
    /// Implementations must make the swap atomic: a concurrent `load` sees
    /// either the previous dataset or `dataset`, never a mix.
    async fn replace(&self, table: &TableName, dataset: &Dataset) -> Result<()>;
}

/// Port: key lookup algorithm (implemented by KeyMatcher)
pub trait Matcher: Send + Sync {
    fn search(
        &self,
        dataset: &Dataset,
        key: &KeyColumn,
        request: &SearchRequest,
        table: &TableName,
    ) -> SearchResult;
}

/// Port: destination sheet (implemented by GoogleSheet, CsvSheet, MemorySheet)
#[async_trait]
pub trait SheetTarget: Send + Sync {
    /// Remove every row from the destination.
    async fn clear(&self) -> Result<()>;

    /// Append one row after the last written one.
    async fn append_row(&self, row: Row) -> Result<()>;

    /// Append several rows in order. Override when the destination can take a
    /// batch in one call.
    async fn append_rows(&self, rows: Vec<Row>) -> Result<()> {
        for row in rows {
            self.append_row(row).await?;
        }
        Ok(())
    }

    /// Short destination label for logs and summaries ("google_sheets", "csv"…).
    fn kind(&self) -> &'static str;
}
