use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::domain::dataset::Row;
use crate::domain::ports::SheetTarget;

#[derive(Debug, Default)]
struct Inner {
    rows: Vec<Row>,
    clears: usize,
    fail_with: Option<String>,
}

/// In-memory sheet.
///
/// Clones share the same rows, so the published layout can be inspected
/// after handing a clone to the pipeline.
#[derive(Debug, Clone, Default)]
pub struct MemorySheet {
    inner: Arc<Mutex<Inner>>,
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows currently on the sheet, top to bottom.
    pub fn rows(&self) -> Vec<Row> {
        self.lock().rows.clone()
    }

    /// How many times the sheet was cleared.
    pub fn clears(&self) -> usize {
        self.lock().clears
    }

    /// Make every following call fail with `message` (an unreachable sheet).
    pub fn fail_with(&self, message: &str) {
        self.lock().fail_with = Some(message.to_string());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(inner: &Inner) -> Result<()> {
        match &inner.fail_with {
            Some(message) => Err(anyhow!(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SheetTarget for MemorySheet {
    async fn clear(&self) -> Result<()> {
        let mut inner = self.lock();
        Self::check(&inner)?;
        inner.rows.clear();
        inner.clears += 1;
        Ok(())
    }

    async fn append_row(&self, row: Row) -> Result<()> {
        let mut inner = self.lock();
        Self::check(&inner)?;
        inner.rows.push(row);
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}
