use thiserror::Error;

/// Failure of one stage of a search run.
///
/// Each stage converts its internal error at its own boundary, so callers
/// only ever see one of these and can show it as a single message.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Required user input was missing; nothing was run.
    #[error("{0}")]
    Validation(String),

    /// The CSV file could not be read or the cache could not be updated.
    #[error("{0:#}")]
    Import(anyhow::Error),

    /// The cached table has no identifier column. Distinct from zero matches.
    #[error("no '{key}' column in table '{table}' (columns: {columns})")]
    KeyColumnNotFound {
        table: String,
        key: String,
        columns: String,
    },

    /// The destination sheet was unreachable or rejected the write. The cache
    /// import that preceded it is kept.
    #[error("{0:#}")]
    Publish(anyhow::Error),
}

impl PipelineError {
    /// Short heading for the message shown to the user.
    pub fn title(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "Missing info",
            PipelineError::Import(_) => "Import error",
            PipelineError::KeyColumnNotFound { .. } => "Key column not found",
            PipelineError::Publish(_) => "Publish error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn import_error_shows_whole_context_chain() {
        let err = PipelineError::Import(anyhow!("disk full").context("Failed to write inventory"));
        assert_eq!(err.to_string(), "Failed to write inventory: disk full");
        assert_eq!(err.title(), "Import error");
    }

    #[test]
    fn key_column_error_lists_columns() {
        let err = PipelineError::KeyColumnNotFound {
            table: "inventory".into(),
            key: "sku".into(),
            columns: "id, qty".into(),
        };
        assert_eq!(
            err.to_string(),
            "no 'sku' column in table 'inventory' (columns: id, qty)"
        );
    }
}
