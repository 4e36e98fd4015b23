//! Embedded table backend
//!
//! Stores each table in its own named sled tree ("parts", "alerts", ...)
//! keyed by the row's `id`. Rows are JSON objects serialized as raw bytes.
//! Queries are evaluated in-process with the same filter and ordering
//! semantics as the hosted row API, so services behave identically against
//! either backend.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sled::{Batch, Db, Tree};
use tracing::{debug, info};

use super::{ensure_filtered, Filter, Query, StoreError, Table, TableStore};

/// sled-backed [`TableStore`].
#[derive(Clone)]
pub struct LocalStore {
    db: Db,
}

impl LocalStore {
    /// Open (or create) the store under `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let db = sled::open(path)?;
        info!(path = %path.display(), "Local table store opened");
        Ok(Self { db })
    }

    /// In-memory store removed on drop. Used by tests and `--backend memory`.
    pub fn temporary() -> Result<Self, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    /// Drop every row of every table.
    pub fn clear(&self) -> Result<(), StoreError> {
        for table in Table::ALL {
            self.tree(table)?.clear()?;
        }
        self.db.flush()?;
        info!("Local table store cleared");
        Ok(())
    }

    fn tree(&self, table: Table) -> Result<Tree, StoreError> {
        Ok(self.db.open_tree(table.name())?)
    }

    fn scan(&self, tree: &Tree, table: Table) -> Result<Vec<Value>, StoreError> {
        tree.iter()
            .values()
            .map(|item| {
                let bytes = item?;
                let row: Value = serde_json::from_slice(&bytes)?;
                if row.is_object() {
                    Ok(row)
                } else {
                    Err(StoreError::InvalidRow {
                        table,
                        reason: "stored row is not an object".to_string(),
                    })
                }
            })
            .collect()
    }
}

fn row_id(table: Table, row: &Value) -> Result<String, StoreError> {
    match row.get("id") {
        Some(Value::String(id)) => Ok(id.clone()),
        _ => Err(StoreError::InvalidRow {
            table,
            reason: "row has no string id".to_string(),
        }),
    }
}

fn as_object(table: Table, row: Value) -> Result<Map<String, Value>, StoreError> {
    match row {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::InvalidRow {
            table,
            reason: "row payload must be a JSON object".to_string(),
        }),
    }
}

/// First unique column on which `candidate` collides with one of `others`.
///
/// Null values never collide, matching SQL unique constraints.
fn unique_violation(table: Table, candidate: &Value, others: &[&Value]) -> Option<String> {
    table.unique_columns().iter().find_map(|column| {
        let value = candidate.get(*column).filter(|v| !v.is_null())?;
        others
            .iter()
            .any(|other| other.get(*column) == Some(value))
            .then(|| format!("duplicate value {value} for {}.{column}", table.name()))
    })
}

#[async_trait]
impl TableStore for LocalStore {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>, StoreError> {
        let tree = self.tree(table)?;
        let mut rows: Vec<Value> = self
            .scan(&tree, table)?
            .into_iter()
            .filter(|row| query.matches(row))
            .collect();
        rows.sort_by(|a, b| query.compare(a, b));
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        debug!(table = %table, rows = rows.len(), "select");
        Ok(rows)
    }

    async fn insert(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>, StoreError> {
        let tree = self.tree(table)?;
        let existing = self.scan(&tree, table)?;
        let now = Value::String(Utc::now().to_rfc3339());

        let mut prepared: Vec<Value> = Vec::with_capacity(rows.len());
        for row in rows {
            let mut map = as_object(table, row)?;
            if !matches!(map.get("id"), Some(Value::String(_))) {
                map.insert("id".into(), Value::String(uuid::Uuid::new_v4().to_string()));
            }
            if map.get("created_at").map_or(true, Value::is_null) {
                map.insert("created_at".into(), now.clone());
            }
            if table.has_updated_at() && map.get("updated_at").map_or(true, Value::is_null) {
                map.insert("updated_at".into(), now.clone());
            }
            let row = Value::Object(map);

            let others: Vec<&Value> = existing.iter().chain(prepared.iter()).collect();
            let id = row_id(table, &row)?;
            if others.iter().any(|o| o.get("id").and_then(Value::as_str) == Some(id.as_str())) {
                return Err(StoreError::Conflict(format!(
                    "duplicate id {id} in {}",
                    table.name()
                )));
            }
            if let Some(message) = unique_violation(table, &row, &others) {
                return Err(StoreError::Conflict(message));
            }
            prepared.push(row);
        }

        let mut batch = Batch::default();
        for row in &prepared {
            batch.insert(row_id(table, row)?.as_bytes(), serde_json::to_vec(row)?);
        }
        tree.apply_batch(batch)?;
        tree.flush_async().await?;
        debug!(table = %table, rows = prepared.len(), "insert");
        Ok(prepared)
    }

    async fn update(
        &self,
        table: Table,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, StoreError> {
        ensure_filtered("update", table, filters)?;
        let mut patch = as_object(table, patch)?;
        patch.remove("id");
        if table.has_updated_at() {
            patch.insert("updated_at".into(), Value::String(Utc::now().to_rfc3339()));
        }

        let tree = self.tree(table)?;
        let all = self.scan(&tree, table)?;
        let (targets, untouched): (Vec<Value>, Vec<Value>) = all
            .into_iter()
            .partition(|row| filters.iter().all(|f| f.matches(row)));

        let mut updated: Vec<Value> = Vec::with_capacity(targets.len());
        for row in targets {
            let mut map = as_object(table, row)?;
            for (key, value) in &patch {
                map.insert(key.clone(), value.clone());
            }
            let row = Value::Object(map);
            let others: Vec<&Value> = untouched.iter().chain(updated.iter()).collect();
            if let Some(message) = unique_violation(table, &row, &others) {
                return Err(StoreError::Conflict(message));
            }
            updated.push(row);
        }

        let mut batch = Batch::default();
        for row in &updated {
            batch.insert(row_id(table, row)?.as_bytes(), serde_json::to_vec(row)?);
        }
        tree.apply_batch(batch)?;
        tree.flush_async().await?;
        debug!(table = %table, rows = updated.len(), "update");
        Ok(updated)
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> Result<usize, StoreError> {
        ensure_filtered("delete", table, filters)?;
        let tree = self.tree(table)?;
        let mut batch = Batch::default();
        let mut removed = 0;
        for row in self.scan(&tree, table)? {
            if filters.iter().all(|f| f.matches(&row)) {
                batch.remove(row_id(table, &row)?.as_bytes());
                removed += 1;
            }
        }
        tree.apply_batch(batch)?;
        tree.flush_async().await?;
        debug!(table = %table, rows = removed, "delete");
        Ok(removed)
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}
