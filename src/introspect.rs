use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool, TypeInfo, ValueRef};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntrospectError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

/// One table or view: declared columns plus a bounded sample of rows in
/// the store's natural order.
#[derive(Debug, Serialize)]
pub struct SchemaObject {
    /// "table" or "view".
    #[serde(rename = "type")]
    pub kind: String,
    pub columns: Vec<ColumnInfo>,
    pub sample_data: Vec<Vec<serde_json::Value>>,
}

/// A full snapshot of the store's schema, keyed by object name.
///
/// Serializes to a flat JSON document; the map is ordered so repeated
/// snapshots of an unchanged store are identical.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct SchemaSnapshot(pub BTreeMap<String, SchemaObject>);

impl SchemaSnapshot {
    pub fn write_to(&self, path: &Path) -> Result<(), IntrospectError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Enumerate every table and view and capture columns plus up to
/// `sample_rows` rows each. Read-only with respect to the store.
pub async fn snapshot(pool: &SqlitePool, sample_rows: u32) -> Result<SchemaSnapshot, IntrospectError> {
    let objects: Vec<(String, String)> = sqlx::query_as(
        "SELECT name, type FROM sqlite_master
         WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%'
         ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    let mut entries = BTreeMap::new();
    for (name, kind) in objects {
        let column_rows = sqlx::query(&format!("PRAGMA table_info(\"{name}\")"))
            .fetch_all(pool)
            .await?;
        let columns = column_rows
            .iter()
            .map(|row| ColumnInfo {
                name: row.get("name"),
                column_type: row.get("type"),
            })
            .collect();

        let rows = sqlx::query(&format!("SELECT * FROM \"{name}\" LIMIT {sample_rows}"))
            .fetch_all(pool)
            .await?;
        let mut sample_data = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut values = Vec::with_capacity(row.len());
            for idx in 0..row.len() {
                values.push(value_to_json(row, idx)?);
            }
            sample_data.push(values);
        }

        entries.insert(
            name,
            SchemaObject {
                kind,
                columns,
                sample_data,
            },
        );
    }
    Ok(SchemaSnapshot(entries))
}

/// Decode one dynamically typed SQLite value into JSON.
fn value_to_json(row: &SqliteRow, idx: usize) -> Result<serde_json::Value, sqlx::Error> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(serde_json::Value::Null);
    }
    let type_name = raw.type_info().name().to_string();
    match type_name.as_str() {
        "INTEGER" => Ok(row.try_get::<i64, _>(idx)?.into()),
        "REAL" => Ok(row.try_get::<f64, _>(idx)?.into()),
        "BLOB" => {
            let bytes: Vec<u8> = row.try_get(idx)?;
            let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
            Ok(serde_json::Value::String(hex))
        }
        _ => Ok(row.try_get::<String, _>(idx)?.into()),
    }
}
