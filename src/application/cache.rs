use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};

use crate::domain::{
    dataset::Dataset,
    fingerprint::fingerprint,
    import_outcome::ImportOutcome,
    ports::CacheStore,
    value_objects::TableName,
};

// ─────────────────────────────────────────────────────────────────────────────
// TableCache
// ─────────────────────────────────────────────────────────────────────────────

/// Keeps the last imported dataset per logical table name.
///
/// # Algorithm
/// For `import_if_changed(name, dataset)`:
/// 1. Load the cached snapshot for `name`. Absent → store `dataset`
///    (`Created`).
/// 2. Present → compare fingerprints. Equal → leave storage alone
///    (`Unchanged`). Different → replace the whole table (`Replaced`).
///
/// Imports of the same name are serialised by a per-name lock, so concurrent
/// callers see last-writer-wins. The store itself guarantees readers never
/// observe a half-written table.
pub struct TableCache {
    store: Arc<dyn CacheStore>,
    locks: Mutex<HashMap<TableName, Arc<AsyncMutex<()>>>>,
}

impl TableCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Import `dataset` under `table`, writing only if its content changed.
    pub async fn import_if_changed(
        &self,
        table: &TableName,
        dataset: &Dataset,
    ) -> Result<ImportOutcome> {
        let lock = self.lock_for(table);
        let _guard = lock.lock().await;

        let new_fp = fingerprint(dataset);

        let existing = self
            .store
            .load(table)
            .await
            .with_context(|| format!("Failed to read cached table {}", table))?;

        let outcome = match existing {
            None => {
                self.write(table, dataset).await?;
                ImportOutcome::Created {
                    table: table.clone(),
                    fingerprint: new_fp,
                }
            }
            Some(cached) => {
                let old_fp = fingerprint(&cached);
                if old_fp == new_fp {
                    debug!(table = %table, fingerprint = %new_fp, "cached table unchanged");
                    ImportOutcome::Unchanged {
                        table: table.clone(),
                        fingerprint: new_fp,
                    }
                } else {
                    self.write(table, dataset).await?;
                    ImportOutcome::Replaced {
                        table: table.clone(),
                        previous: old_fp,
                        fingerprint: new_fp,
                    }
                }
            }
        };

        info!(
            table = %table,
            rows = dataset.row_count(),
            outcome = outcome.label(),
            "import completed"
        );
        Ok(outcome)
    }

    /// Read the cached snapshot for `table`.
    pub async fn load(&self, table: &TableName) -> Result<Option<Dataset>> {
        self.store
            .load(table)
            .await
            .with_context(|| format!("Failed to read cached table {}", table))
    }

    async fn write(&self, table: &TableName, dataset: &Dataset) -> Result<()> {
        self.store
            .replace(table, dataset)
            .await
            .with_context(|| format!("Failed to write cached table {}", table))
    }

    fn lock_for(&self, table: &TableName) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(table.clone()).or_default())
    }
}
