use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::dataset::Dataset;
use crate::domain::ports::CacheStore;
use crate::domain::value_objects::TableName;

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<TableName, Dataset>,
    writes: usize,
    fail_next_write: Option<String>,
}

/// In-memory implementation of [`CacheStore`].
///
/// Clones share the same tables, so a test can hand one clone to
/// `TableCache` and inspect the other afterwards.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `replace` calls so far.
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    /// Make the next `replace` fail with `message`.
    pub fn fail_next_write(&self, message: &str) {
        self.lock().fail_next_write = Some(message.to_string());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn load(&self, table: &TableName) -> Result<Option<Dataset>> {
        Ok(self.lock().tables.get(table).cloned())
    }

    async fn replace(&self, table: &TableName, dataset: &Dataset) -> Result<()> {
        let mut inner = self.lock();
        if let Some(message) = inner.fail_next_write.take() {
            return Err(anyhow!(message));
        }
        inner.tables.insert(table.clone(), dataset.clone());
        inner.writes += 1;
        Ok(())
    }
}
