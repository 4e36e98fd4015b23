//! TableStore trait - pluggable row backend
//!
//! Every service talks to its tables through [`TableStore`] so the hosted
//! row API and the embedded development store can be swapped without
//! touching business logic:
//! - `RemoteStore`: hosted PostgREST endpoint (`/rest/v1/<table>`)
//! - `LocalStore`: one sled tree per table, same filter/order semantics
//!
//! Rows cross the trait as JSON objects; the typed helpers at the bottom of
//! this module convert them to and from the structs in `crate::types`.

mod local;
mod query;
mod remote;

pub use local::LocalStore;
pub use query::{Filter, Order, Query};
pub use remote::{RemoteConfig, RemoteStore};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// The backend tables used by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Machine,
    Parts,
    PartInventory,
    MaintenanceRecords,
    MaintenancePartsUsed,
    PreventiveSchedules,
    SensorReadings,
    Vendors,
    PurchaseOrders,
    Alerts,
}

impl Table {
    pub const ALL: [Self; 10] = [
        Self::Machine,
        Self::Parts,
        Self::PartInventory,
        Self::MaintenanceRecords,
        Self::MaintenancePartsUsed,
        Self::PreventiveSchedules,
        Self::SensorReadings,
        Self::Vendors,
        Self::PurchaseOrders,
        Self::Alerts,
    ];

    /// Backend table name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Machine => "machine",
            Self::Parts => "parts",
            Self::PartInventory => "part_inventory",
            Self::MaintenanceRecords => "maintenance_records",
            Self::MaintenancePartsUsed => "maintenance_parts_used",
            Self::PreventiveSchedules => "preventive_schedules",
            Self::SensorReadings => "sensor_readings",
            Self::Vendors => "vendors",
            Self::PurchaseOrders => "purchase_orders",
            Self::Alerts => "alerts",
        }
    }

    /// Columns carrying a unique constraint in the hosted schema.
    pub fn unique_columns(&self) -> &'static [&'static str] {
        match self {
            Self::Parts => &["part_number"],
            Self::PartInventory => &["part_id"],
            Self::MaintenanceRecords => &["work_order_number"],
            Self::PurchaseOrders => &["po_number"],
            _ => &[],
        }
    }

    /// Whether the table has an `updated_at` column maintained on update.
    pub fn has_updated_at(&self) -> bool {
        !matches!(
            self,
            Self::MaintenancePartsUsed | Self::SensorReadings | Self::Alerts
        )
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned {status}: {message}")]
    Backend { status: u16, message: String },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("no matching row in {0}")]
    NotFound(Table),
    #[error("expected a single row in {table}, found {count}")]
    NotSingle { table: Table, count: usize },
    #[error("invalid row in {table}: {reason}")]
    InvalidRow { table: Table, reason: String },
    #[error("refusing unfiltered {op} on {table}")]
    Unfiltered { op: &'static str, table: Table },
}

/// Row-level access to the backend tables.
///
/// Implementations must be thread-safe (Send + Sync) for shared access
/// across request handlers.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Rows matching every filter, in the requested order.
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>, StoreError>;

    /// Insert rows and return them as stored (with `id` and timestamps).
    async fn insert(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>, StoreError>;

    /// Merge `patch` into every row matching `filters`; returns updated rows.
    async fn update(
        &self,
        table: Table,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, StoreError>;

    /// Delete rows matching `filters`; returns how many were removed.
    async fn delete(&self, table: Table, filters: &[Filter]) -> Result<usize, StoreError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Refuse mutations that would hit a whole table.
pub(crate) fn ensure_filtered(
    op: &'static str,
    table: Table,
    filters: &[Filter],
) -> Result<(), StoreError> {
    if filters.is_empty() {
        Err(StoreError::Unfiltered { op, table })
    } else {
        Ok(())
    }
}

// ============================================================================
// Typed helpers
// ============================================================================

fn decode<T: DeserializeOwned>(table: Table, row: Value) -> Result<T, StoreError> {
    serde_json::from_value(row).map_err(|e| StoreError::InvalidRow {
        table,
        reason: e.to_string(),
    })
}

fn encode<T: Serialize>(table: Table, row: &T) -> Result<Value, StoreError> {
    let value = serde_json::to_value(row)?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(StoreError::InvalidRow {
            table,
            reason: "row payload must be a JSON object".to_string(),
        })
    }
}

/// Select and decode rows.
pub async fn fetch<T: DeserializeOwned>(
    store: &dyn TableStore,
    table: Table,
    query: &Query,
) -> Result<Vec<T>, StoreError> {
    store
        .select(table, query)
        .await?
        .into_iter()
        .map(|row| decode(table, row))
        .collect()
}

/// Exactly one matching row.
pub async fn fetch_single<T: DeserializeOwned>(
    store: &dyn TableStore,
    table: Table,
    query: &Query,
) -> Result<T, StoreError> {
    let mut rows = store.select(table, query).await?;
    match rows.len() {
        0 => Err(StoreError::NotFound(table)),
        1 => decode(table, rows.remove(0)),
        count => Err(StoreError::NotSingle { table, count }),
    }
}

/// The first matching row, if any.
pub async fn fetch_optional<T: DeserializeOwned>(
    store: &dyn TableStore,
    table: Table,
    query: &Query,
) -> Result<Option<T>, StoreError> {
    let query = query.clone().limit(1);
    let rows = store.select(table, &query).await?;
    rows.into_iter().next().map(|row| decode(table, row)).transpose()
}

/// Insert one row and decode what the backend stored.
pub async fn insert_one<P: Serialize + Sync, T: DeserializeOwned>(
    store: &dyn TableStore,
    table: Table,
    payload: &P,
) -> Result<T, StoreError> {
    let row = encode(table, payload)?;
    let stored = store.insert(table, vec![row]).await?;
    stored
        .into_iter()
        .next()
        .ok_or(StoreError::NotFound(table))
        .and_then(|row| decode(table, row))
}

/// Insert several rows in one call.
pub async fn insert_many<P: Serialize + Sync, T: DeserializeOwned>(
    store: &dyn TableStore,
    table: Table,
    payloads: &[P],
) -> Result<Vec<T>, StoreError> {
    if payloads.is_empty() {
        return Ok(Vec::new());
    }
    let rows = payloads
        .iter()
        .map(|p| encode(table, p))
        .collect::<Result<Vec<_>, _>>()?;
    store
        .insert(table, rows)
        .await?
        .into_iter()
        .map(|row| decode(table, row))
        .collect()
}

/// Patch matching rows and decode the results.
pub async fn update_where<P: Serialize + Sync, T: DeserializeOwned>(
    store: &dyn TableStore,
    table: Table,
    filters: &[Filter],
    patch: &P,
) -> Result<Vec<T>, StoreError> {
    let patch = encode(table, patch)?;
    store
        .update(table, filters, patch)
        .await?
        .into_iter()
        .map(|row| decode(table, row))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_metadata() {
        assert_eq!(Table::PartInventory.name(), "part_inventory");
        assert_eq!(Table::ALL.len(), 10);
        assert!(Table::Parts.has_updated_at());
        assert!(!Table::Alerts.has_updated_at());
        assert_eq!(Table::PurchaseOrders.unique_columns(), &["po_number"]);
        assert!(Table::Vendors.unique_columns().is_empty());
    }

    #[test]
    fn test_unfiltered_mutation_refused() {
        let err = ensure_filtered("delete", Table::Vendors, &[]).unwrap_err();
        assert!(matches!(err, StoreError::Unfiltered { op: "delete", .. }));
        assert!(ensure_filtered("delete", Table::Vendors, &[Filter::eq("id", "v1")]).is_ok());
    }
}
