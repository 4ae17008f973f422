use serde_json::Value;

use crate::domain::dataset::Dataset;
use crate::domain::value_objects::{ColumnName, TableName};

// ─────────────────────────────────────────────────────────────────────────────
// Identifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Quote an identifier for SQLite: `"name"`, embedded quotes doubled.
pub fn quote_ident(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

// ─────────────────────────────────────────────────────────────────────────────
// Query builders
// ─────────────────────────────────────────────────────────────────────────────

/// `SELECT * FROM "<table>" ORDER BY rowid`: rows come back in insert order.
pub fn build_select_query(table: &TableName) -> String {
    format!("SELECT * FROM {} ORDER BY rowid", quote_ident(&table.0))
}

pub fn build_drop_query(table: &TableName) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_ident(&table.0))
}

/// `CREATE TABLE` with one declared type per column (see [`column_affinity`]).
pub fn build_create_query(table: &TableName, dataset: &Dataset) -> String {
    let cols: Vec<String> = dataset
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| match column_affinity(dataset, idx) {
            Some(ty) => format!("{} {}", quote_ident(&col.0), ty),
            None => quote_ident(&col.0),
        })
        .collect();
    format!("CREATE TABLE {} ({})", quote_ident(&table.0), cols.join(", "))
}

/// `INSERT INTO "<table>" ("a", "b") VALUES (?, ?)`
pub fn build_insert_query(table: &TableName, columns: &[ColumnName]) -> String {
    let cols: Vec<String> = columns.iter().map(|c| quote_ident(&c.0)).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(&table.0),
        cols.join(", "),
        placeholders
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Column typing
// ─────────────────────────────────────────────────────────────────────────────

/// Declared SQLite type for column `idx`, from the non-null cells it holds.
///
/// Only homogeneous columns get a type (`INTEGER`, `REAL`, `TEXT`). Mixed
/// columns are left untyped so SQLite stores each cell with its own storage
/// class; a declared affinity would coerce them and the reloaded dataset
/// would no longer fingerprint like the imported one.
pub fn column_affinity(dataset: &Dataset, idx: usize) -> Option<&'static str> {
    let mut kind: Option<&'static str> = None;
    for row in dataset.rows() {
        let cell_kind = match row.get(idx) {
            None | Some(Value::Null) => continue,
            Some(Value::Number(n)) if n.is_i64() => "INTEGER",
            Some(Value::Number(_)) => "REAL",
            Some(Value::String(_)) => "TEXT",
            Some(_) => return None,
        };
        match kind {
            None => kind = Some(cell_kind),
            Some(k) if k == cell_kind => {}
            Some(_) => return None,
        }
    }
    kind
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::Row;
    use serde_json::json;

    fn dataset(columns: &[&str], rows: Vec<Row>) -> Dataset {
        Dataset::new(
            columns.iter().map(|c| ColumnName(c.to_string())).collect(),
            rows,
        )
        .unwrap()
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("inventory"), r#""inventory""#);
        assert_eq!(quote_ident(r#"we"ird"#), r#""we""ird""#);
    }

    #[test]
    fn test_build_select_query_orders_by_rowid() {
        let q = build_select_query(&TableName("stock 2024".into()));
        assert_eq!(q, r#"SELECT * FROM "stock 2024" ORDER BY rowid"#);
    }

    #[test]
    fn test_build_insert_query() {
        let q = build_insert_query(
            &TableName("inventory".into()),
            &[ColumnName("sku".into()), ColumnName("qty".into())],
        );
        assert_eq!(
            q,
            r#"INSERT INTO "inventory" ("sku", "qty") VALUES (?, ?)"#
        );
    }

    #[test]
    fn test_build_create_query_declares_homogeneous_types() {
        let ds = dataset(
            &["sku", "qty", "price", "note"],
            vec![
                vec![json!("A1"), json!(5), json!(1.5), json!("x")],
                vec![json!("A2"), Value::Null, json!(2.25), json!(3)],
            ],
        );
        assert_eq!(
            build_create_query(&TableName("inventory".into()), &ds),
            r#"CREATE TABLE "inventory" ("sku" TEXT, "qty" INTEGER, "price" REAL, "note")"#
        );
    }

    #[test]
    fn test_column_affinity_all_null_is_untyped() {
        let ds = dataset(&["v"], vec![vec![Value::Null], vec![Value::Null]]);
        assert_eq!(column_affinity(&ds, 0), None);
    }

    #[test]
    fn test_column_affinity_mixed_numbers_is_untyped() {
        let ds = dataset(&["v"], vec![vec![json!(1)], vec![json!(1.5)]]);
        assert_eq!(column_affinity(&ds, 0), None);
    }
}
