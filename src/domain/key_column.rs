use tracing::warn;

use crate::domain::value_objects::{ColumnName, KeyColumn};

/// Logical name of the identifier column looked up in every dataset.
pub const DEFAULT_KEY_COLUMN: &str = "sku";

/// Locate the key column in a header.
///
/// Columns are scanned in order; the first whose trimmed, lower-cased name
/// equals the trimmed, lower-cased `logical_key` wins. Returns `None` when no
/// column matches. If several columns match, the first is used and the rest
/// are reported with a warning.
pub fn resolve_key_column(columns: &[ColumnName], logical_key: &str) -> Option<KeyColumn> {
    let wanted = fold(logical_key);
    let mut matches = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| fold(&c.0) == wanted);

    let (index, name) = matches.next()?;
    let extra: Vec<&str> = matches.map(|(_, c)| c.0.as_str()).collect();
    if !extra.is_empty() {
        warn!(
            key = logical_key,
            using = %name,
            ignored = ?extra,
            "several columns match the key column name"
        );
    }

    Some(KeyColumn {
        name: name.clone(),
        index,
    })
}

fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}
