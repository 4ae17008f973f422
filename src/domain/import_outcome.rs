use serde::Serialize;

use crate::domain::value_objects::{Fingerprint, TableName};

/// What `TableCache::import_if_changed` did with the imported dataset.
///
/// Every variant carries the logical table name to query afterwards, so a
/// caller cannot get a usable name without going through one of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportOutcome {
    /// No cached entry existed; the dataset was stored.
    Created {
        table: TableName,
        fingerprint: Fingerprint,
    },

    /// The cached entry already had the same fingerprint; storage untouched.
    Unchanged {
        table: TableName,
        fingerprint: Fingerprint,
    },

    /// The cached entry differed and was replaced wholesale.
    Replaced {
        table: TableName,
        previous: Fingerprint,
        fingerprint: Fingerprint,
    },
}

impl ImportOutcome {
    pub fn table(&self) -> &TableName {
        match self {
            ImportOutcome::Created { table, .. }
            | ImportOutcome::Unchanged { table, .. }
            | ImportOutcome::Replaced { table, .. } => table,
        }
    }

    /// Fingerprint of the entry now held by the cache.
    pub fn fingerprint(&self) -> &Fingerprint {
        match self {
            ImportOutcome::Created { fingerprint, .. }
            | ImportOutcome::Unchanged { fingerprint, .. }
            | ImportOutcome::Replaced { fingerprint, .. } => fingerprint,
        }
    }

    /// Returns `true` if the cache was written.
    pub fn wrote(&self) -> bool {
        !matches!(self, ImportOutcome::Unchanged { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            ImportOutcome::Created { .. } => "created",
            ImportOutcome::Unchanged { .. } => "unchanged",
            ImportOutcome::Replaced { .. } => "replaced",
        }
    }
}
