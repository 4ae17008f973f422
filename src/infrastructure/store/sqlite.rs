use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Row, Sqlite, TypeInfo, ValueRef};
use tracing::debug;

use crate::domain::dataset::Dataset;
use crate::domain::ports::CacheStore;
use crate::domain::value_objects::{ColumnName, TableName};
use crate::infrastructure::config::CacheConfig;
use crate::infrastructure::store::sql::{
    build_create_query, build_drop_query, build_insert_query, build_select_query,
};

pub struct SqliteCacheStore {
    pool: SqlitePool,
}

/// Open (creating if needed) the SQLite cache described in `cfg`.
pub async fn connect(cfg: &CacheConfig) -> Result<SqliteCacheStore> {
    if let Some(parent) = cfg.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create cache directory {}", parent.display()))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(&cfg.path)
        .create_if_missing(true);

    // Single connection: readers never race a replace.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open cache database {}", cfg.path.display()))?;

    debug!("Opened cache database {}", cfg.path.display());

    Ok(SqliteCacheStore { pool })
}

/// Decode one cell by the storage class SQLite reports for it.
fn decode_cell(row: &SqliteRow, idx: usize) -> Result<Value> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage = raw.type_info().name().to_uppercase();

    let v = match storage.as_str() {
        "INTEGER" | "INT" | "INT8" | "BIGINT" => Value::from(row.try_get::<i64, _>(idx)?),
        "REAL" | "FLOAT" | "DOUBLE" => serde_json::Number::from_f64(row.try_get::<f64, _>(idx)?)
            .map_or(Value::Null, Value::Number),
        "BLOB" => {
            let bytes: Vec<u8> = row.try_get(idx)?;
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => Value::String(row.try_get::<String, _>(idx)?),
    };
    Ok(v)
}

fn bind_cell<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    cell: &Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match cell {
        Value::Null => query.bind(None::<String>),
        Value::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64()),
        },
        Value::String(s) => query.bind(s.clone()),
        other => query.bind(other.to_string()),
    }
}

#[async_trait]
impl CacheStore for SqliteCacheStore {
    async fn load(&self, table: &TableName) -> Result<Option<Dataset>> {
        // Read inside one transaction so a concurrent replace is either fully
        // visible or not at all.
        let mut tx = self.pool.begin().await?;

        let exists: Option<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(&table.0)
        .fetch_optional(&mut *tx)
        .await
        .with_context(|| format!("Failed to look up table {}", table))?;

        if exists.is_none() {
            tx.commit().await?;
            return Ok(None);
        }

        let columns: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_table_info(?) ORDER BY cid")
                .bind(&table.0)
                .fetch_all(&mut *tx)
                .await
                .with_context(|| format!("Failed to read columns of {}", table))?;

        let query = build_select_query(table);
        debug!("Executing: {}", query);

        let rows = sqlx::query(&query)
            .fetch_all(&mut *tx)
            .await
            .with_context(|| format!("Failed to query {}", table))?;
        tx.commit().await?;

        let mut result = Vec::with_capacity(rows.len());
        for row in &rows {
            let cells = (0..columns.len())
                .map(|idx| decode_cell(row, idx))
                .collect::<Result<Vec<_>>>()?;
            result.push(cells);
        }

        let columns = columns.into_iter().map(ColumnName).collect();
        Ok(Some(Dataset::new(columns, result)?))
    }

    async fn replace(&self, table: &TableName, dataset: &Dataset) -> Result<()> {
        if dataset.columns().is_empty() {
            bail!("Cannot cache {}: dataset has no columns", table);
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query(&build_drop_query(table))
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to drop {}", table))?;

        let create = build_create_query(table, dataset);
        debug!("Executing: {}", create);
        sqlx::query(&create)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to create {}", table))?;

        let insert = build_insert_query(table, dataset.columns());
        for row in dataset.rows() {
            let mut query = sqlx::query(&insert);
            for cell in row {
                query = bind_cell(query, cell);
            }
            query
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to insert into {}", table))?;
        }

        tx.commit()
            .await
            .with_context(|| format!("Failed to commit {}", table))?;

        debug!(table = %table, rows = dataset.row_count(), "cache table replaced");
        Ok(())
    }
}
