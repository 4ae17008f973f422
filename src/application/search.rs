use std::collections::BTreeSet;

use crate::domain::{
    dataset::{cell_text, Dataset},
    ports::Matcher,
    search::{normalize_key, SearchRequest, SearchResult},
    value_objects::{KeyColumn, TableName},
};

// ─── Key Matcher (implementation of the port) ───

/// Exact-membership lookup of requested keys against the key column.
///
/// Rows are scanned in source order and kept when their normalised key cell
/// (text form, trimmed, lower-cased) is in the request. Null key cells never
/// match. Every requested key ends up either in a matched row or in
/// `not_found`, never both.
#[derive(Default)]
pub struct KeyMatcher;

impl KeyMatcher {
    pub fn new() -> Self {
        Self
    }
}

impl Matcher for KeyMatcher {
    fn search(
        &self,
        dataset: &Dataset,
        key: &KeyColumn,
        request: &SearchRequest,
        _table: &TableName,
    ) -> SearchResult {
        if request.is_empty() {
            return SearchResult::default();
        }

        let mut matched = Vec::new();
        let mut found: BTreeSet<String> = BTreeSet::new();

        for row in dataset.rows() {
            let Some(cell) = row.get(key.index).and_then(cell_text) else {
                continue;
            };
            let normalized = normalize_key(&cell);
            if request.contains(&normalized) {
                matched.push(row.clone());
                found.insert(normalized);
            }
        }

        let not_found = request
            .normalized_keys()
            .filter(|k| !found.contains(*k))
            .filter_map(|k| request.display(k))
            .map(str::to_string)
            .collect();

        SearchResult { matched, not_found }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::Row;
    use crate::domain::key_column::{resolve_key_column, DEFAULT_KEY_COLUMN};
    use crate::domain::value_objects::ColumnName;
    use serde_json::{json, Value};

    fn dataset(columns: &[&str], rows: Vec<Row>) -> Dataset {
        Dataset::new(
            columns.iter().map(|c| ColumnName(c.to_string())).collect(),
            rows,
        )
        .unwrap()
    }

    fn inventory() -> Dataset {
        dataset(
            &["sku", "qty"],
            vec![
                vec![json!("A1"), json!(5)],
                vec![json!("A2"), json!(0)],
                vec![json!("A3"), json!(12)],
            ],
        )
    }

    fn search(ds: &Dataset, keys: &[&str]) -> SearchResult {
        let key = resolve_key_column(ds.columns(), DEFAULT_KEY_COLUMN).unwrap();
        KeyMatcher::new().search(
            ds,
            &key,
            &SearchRequest::new(keys.iter().copied()),
            &TableName("inventory".into()),
        )
    }

    #[test]
    fn matches_in_source_order_and_reports_missing() {
        let result = search(&inventory(), &["a1", " A3 ", "Z9"]);
        assert_eq!(
            result.matched,
            vec![vec![json!("A1"), json!(5)], vec![json!("A3"), json!(12)]]
        );
        assert_eq!(result.not_found.into_iter().collect::<Vec<_>>(), vec!["Z9"]);
    }

    #[test]
    fn request_order_does_not_change_row_order() {
        let result = search(&inventory(), &["A3", "A1"]);
        assert_eq!(result.matched[0][0], json!("A1"));
        assert_eq!(result.matched[1][0], json!("A3"));
    }

    #[test]
    fn empty_request_is_vacuous() {
        let result = search(&inventory(), &[]);
        assert!(result.is_empty());
    }

    #[test]
    fn duplicate_request_keys_match_once() {
        let result = search(&inventory(), &["A1", "A1"]);
        assert_eq!(result.matched.len(), 1);
        assert!(result.not_found.is_empty());
    }

    #[test]
    fn duplicate_rows_in_data_are_kept() {
        let ds = dataset(
            &["SKU"],
            vec![vec![json!("B7")], vec![json!("C1")], vec![json!(" b7 ")]],
        );
        let result = search(&ds, &["B7"]);
        assert_eq!(result.matched.len(), 2);
        assert!(result.not_found.is_empty());
    }

    #[test]
    fn numeric_key_cells_match_their_text_form() {
        let ds = dataset(&["sku"], vec![vec![json!(1001)], vec![json!(1002)]]);
        let result = search(&ds, &["1002", "1003"]);
        assert_eq!(result.matched, vec![vec![json!(1002)]]);
        assert_eq!(result.not_found.into_iter().collect::<Vec<_>>(), vec!["1003"]);
    }

    #[test]
    fn null_key_cells_never_match() {
        let ds = dataset(&["sku"], vec![vec![Value::Null]]);
        let result = search(&ds, &["null"]);
        assert!(result.matched.is_empty());
        assert_eq!(result.not_found.len(), 1);
    }

    #[test]
    fn every_requested_key_lands_in_exactly_one_side() {
        let ds = inventory();
        let keys = ["A1", "a2", "Q", "A1 ", "r", "A3"];
        let request = SearchRequest::new(keys);
        let result = search(&ds, &keys);

        let found: BTreeSet<String> = result
            .matched
            .iter()
            .filter_map(|r| cell_text(&r[0]))
            .map(|s| normalize_key(&s))
            .collect();
        let missing: BTreeSet<String> =
            result.not_found.iter().map(|s| normalize_key(s)).collect();

        for key in request.normalized_keys() {
            assert!(
                found.contains(key) ^ missing.contains(key),
                "{key} must be in exactly one side"
            );
        }
        assert_eq!(found.len() + missing.len(), request.len());
    }
}
