//! Alerts board and alert raising.

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use super::{ServiceError, ServiceResult};
use crate::store::{self, Filter, Query, Table, TableStore};
use crate::types::{Alert, AlertBoard, NewAlert};

/// Alert types raised by the service itself.
pub const SENSOR_ALARM: &str = "sensor_alarm";
pub const LOW_STOCK: &str = "low_stock";

/// All alerts, newest first, split into active and resolved.
pub async fn list_alerts(store: &dyn TableStore) -> ServiceResult<AlertBoard> {
    let alerts: Vec<Alert> =
        store::fetch(store, Table::Alerts, &Query::new().order_by("created_at", false)).await?;
    let unread = alerts
        .iter()
        .filter(|a| !a.is_read.unwrap_or(false) && !a.is_resolved.unwrap_or(false))
        .count();
    let (resolved, active): (Vec<Alert>, Vec<Alert>) = alerts
        .into_iter()
        .partition(|a| a.is_resolved.unwrap_or(false));
    Ok(AlertBoard {
        active,
        resolved,
        unread,
    })
}

/// Insert an alert.
pub async fn raise(store: &dyn TableStore, alert: NewAlert) -> ServiceResult<Alert> {
    let alert: Alert = store::insert_one(store, Table::Alerts, &alert).await?;
    warn!(alert_type = %alert.alert_type, severity = ?alert.severity, title = %alert.title, "Alert raised");
    Ok(alert)
}

/// Raise an alert as a side effect of another operation. A failure here is
/// logged and does not fail the operation that triggered it.
pub(crate) async fn raise_best_effort(store: &dyn TableStore, alert: NewAlert) {
    if let Err(e) = raise(store, alert).await {
        warn!(error = %e, "Failed to raise alert");
    }
}

async fn patch_alert(store: &dyn TableStore, id: &str, patch: serde_json::Value) -> ServiceResult<Alert> {
    let mut updated: Vec<Alert> =
        store::update_where(store, Table::Alerts, &[Filter::eq("id", id)], &patch).await?;
    updated
        .pop()
        .ok_or_else(|| ServiceError::NotFound(format!("alert {id}")))
}

pub async fn mark_read(store: &dyn TableStore, id: &str) -> ServiceResult<Alert> {
    patch_alert(store, id, json!({ "is_read": true })).await
}

/// Resolve an alert, stamping `resolved_at`.
pub async fn resolve(store: &dyn TableStore, id: &str) -> ServiceResult<Alert> {
    let alert = patch_alert(
        store,
        id,
        json!({ "is_resolved": true, "resolved_at": Utc::now().to_rfc3339() }),
    )
    .await?;
    info!(alert = %alert.id, "Alert resolved");
    Ok(alert)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalStore;
    use crate::types::AlertSeverity;

    #[tokio::test]
    async fn test_board_split_and_actions() {
        let store = LocalStore::temporary().unwrap();
        let first = raise(
            &store,
            NewAlert::new(SENSOR_ALARM, AlertSeverity::Critical, "Drum temp".into(), "Too hot".into()),
        )
        .await
        .unwrap();
        raise(
            &store,
            NewAlert::new(LOW_STOCK, AlertSeverity::Warning, "Belt low".into(), "2 left".into())
                .related_to("part", "p1"),
        )
        .await
        .unwrap();

        let board = list_alerts(&store).await.unwrap();
        assert_eq!(board.active.len(), 2);
        assert_eq!(board.unread, 2);

        let read = mark_read(&store, &first.id).await.unwrap();
        assert_eq!(read.is_read, Some(true));
        let resolved = resolve(&store, &first.id).await.unwrap();
        assert!(resolved.resolved_at.is_some());

        let board = list_alerts(&store).await.unwrap();
        assert_eq!(board.active.len(), 1);
        assert_eq!(board.resolved.len(), 1);
        assert_eq!(board.unread, 1);
        assert_eq!(board.active[0].related_entity_id.as_deref(), Some("p1"));

        assert!(matches!(resolve(&store, "nope").await, Err(ServiceError::NotFound(_))));
    }
}
