//! Spare parts catalogue, stock counts and reorder suggestions.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::json;
use tracing::info;

use super::{ServiceError, ServiceResult};
use crate::store::{self, Filter, Query, Table, TableStore};
use crate::types::{
    NewInventory, NewPart, Part, PartInventory, PartWithStock, ReorderLine, StockStatus,
};

/// Stock badge for a part given its inventory row.
pub fn stock_status(part: &Part, inventory: Option<&PartInventory>) -> StockStatus {
    let Some(inventory) = inventory else {
        return StockStatus::NoData;
    };
    let available = inventory.available();
    if available <= 0 {
        StockStatus::OutOfStock
    } else if available <= part.reorder_point {
        StockStatus::LowStock
    } else {
        StockStatus::InStock
    }
}

fn with_stock(part: Part, inventory: Option<PartInventory>) -> PartWithStock {
    let stock_status = stock_status(&part, inventory.as_ref());
    let needs_reorder = inventory
        .as_ref()
        .is_some_and(|inv| inv.available() <= part.reorder_point);
    PartWithStock {
        part,
        inventory,
        stock_status,
        needs_reorder,
    }
}

/// Case-insensitive substring match over name, part number and category.
fn matches_search(part: &Part, needle: &str) -> bool {
    [&part.name, &part.part_number, &part.category]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

/// All parts ordered by name, joined with their inventory rows.
pub async fn list_parts(
    store: &dyn TableStore,
    search: Option<&str>,
) -> ServiceResult<Vec<PartWithStock>> {
    let parts: Vec<Part> =
        store::fetch(store, Table::Parts, &Query::new().order_by("name", true)).await?;
    let inventory: Vec<PartInventory> =
        store::fetch(store, Table::PartInventory, &Query::new()).await?;
    let mut by_part: HashMap<String, PartInventory> = inventory
        .into_iter()
        .map(|inv| (inv.part_id.clone(), inv))
        .collect();

    let needle = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    Ok(parts
        .into_iter()
        .filter(|p| needle.as_deref().map_or(true, |n| matches_search(p, n)))
        .map(|p| {
            let inv = by_part.remove(&p.id);
            with_stock(p, inv)
        })
        .collect())
}

/// Create a part together with its empty inventory row.
pub async fn create_part(store: &dyn TableStore, form: NewPart) -> ServiceResult<PartWithStock> {
    let form = form.normalize().map_err(ServiceError::invalid)?;
    let part: Part = store::insert_one(store, Table::Parts, &form).await?;
    let inventory: PartInventory =
        store::insert_one(store, Table::PartInventory, &NewInventory::empty(&part.id)).await?;
    info!(part = %part.part_number, "Part created");
    Ok(with_stock(part, Some(inventory)))
}

/// Part and inventory by part id.
pub async fn get_part(store: &dyn TableStore, part_id: &str) -> ServiceResult<PartWithStock> {
    let part: Part = store::fetch_optional(store, Table::Parts, &Query::new().eq("id", part_id))
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("part {part_id}")))?;
    let inventory = inventory_for(store, part_id).await?;
    Ok(with_stock(part, inventory))
}

pub(crate) async fn inventory_for(
    store: &dyn TableStore,
    part_id: &str,
) -> ServiceResult<Option<PartInventory>> {
    Ok(store::fetch_optional(
        store,
        Table::PartInventory,
        &Query::new().eq("part_id", part_id),
    )
    .await?)
}

/// Record a physical stock count: on-hand and available both become
/// `quantity`.
pub async fn set_stock(
    store: &dyn TableStore,
    part_id: &str,
    quantity: i64,
) -> ServiceResult<PartWithStock> {
    if quantity < 0 {
        return Err(ServiceError::Validation("quantity cannot be negative".into()));
    }
    let patch = json!({
        "quantity_on_hand": quantity,
        "quantity_available": quantity,
        "last_counted_at": Utc::now().to_rfc3339(),
    });
    let updated: Vec<PartInventory> = store::update_where(
        store,
        Table::PartInventory,
        &[Filter::eq("part_id", part_id)],
        &patch,
    )
    .await?;
    if updated.is_empty() {
        return Err(ServiceError::NotFound(format!("inventory for part {part_id}")));
    }
    info!(part = %part_id, quantity, "Stock counted");
    get_part(store, part_id).await
}

/// Parts at or below their reorder point, most urgent first.
pub async fn reorder_list(store: &dyn TableStore) -> ServiceResult<Vec<ReorderLine>> {
    let mut lines: Vec<ReorderLine> = list_parts(store, None)
        .await?
        .into_iter()
        .filter(|p| p.needs_reorder)
        .filter_map(|p| {
            let available = p.inventory.as_ref()?.available();
            let suggested = p.part.reorder_quantity.max(p.part.reorder_point - available).max(1);
            Some(ReorderLine {
                estimated_cost: suggested as f64 * p.part.unit_cost,
                part_id: p.part.id,
                part_number: p.part.part_number,
                name: p.part.name,
                available,
                reorder_point: p.part.reorder_point,
                suggested_quantity: suggested,
                lead_time_days: p.part.lead_time_days,
            })
        })
        .collect();
    lines.sort_by_key(|l| (l.available - l.reorder_point, std::cmp::Reverse(l.lead_time_days)));
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{LocalStore, StoreError};

    fn new_part(number: &str, name: &str, reorder_point: i64) -> NewPart {
        serde_json::from_value(json!({
            "part_number": number,
            "name": name,
            "category": "Drum",
            "unit_cost": 25.0,
            "reorder_point": reorder_point,
            "reorder_quantity": 4,
            "lead_time_days": 10,
        }))
        .unwrap()
    }

    #[test]
    fn test_stock_status_thresholds() {
        let part: Part = serde_json::from_value(json!({
            "id": "p", "part_number": "P", "name": "n", "category": "c", "reorder_point": 5
        }))
        .unwrap();
        let inv = |available: i64| -> PartInventory {
            serde_json::from_value(json!({"id": "i", "part_id": "p", "quantity_available": available})).unwrap()
        };
        assert_eq!(stock_status(&part, None), StockStatus::NoData);
        assert_eq!(stock_status(&part, Some(&inv(0))), StockStatus::OutOfStock);
        assert_eq!(stock_status(&part, Some(&inv(-2))), StockStatus::OutOfStock);
        assert_eq!(stock_status(&part, Some(&inv(5))), StockStatus::LowStock);
        assert_eq!(stock_status(&part, Some(&inv(6))), StockStatus::InStock);
    }

    #[tokio::test]
    async fn test_create_part_adds_empty_inventory() {
        let store = LocalStore::temporary().unwrap();
        let created = create_part(&store, new_part("BRN-01", "Burner nozzle", 2)).await.unwrap();
        let inv = created.inventory.unwrap();
        assert_eq!(inv.quantity_on_hand, 0);
        assert_eq!(inv.available(), 0);
        assert_eq!(created.stock_status, StockStatus::OutOfStock);
    }

    #[tokio::test]
    async fn test_create_part_validates_and_rejects_duplicates() {
        let store = LocalStore::temporary().unwrap();
        let err = create_part(&store, new_part(" ", "", 0)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        create_part(&store, new_part("BRN-01", "Burner nozzle", 2)).await.unwrap();
        let err = create_part(&store, new_part("BRN-01", "Again", 2)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_list_search_and_stock_count() {
        let store = LocalStore::temporary().unwrap();
        let belt = create_part(&store, new_part("BLT-9", "Drive belt", 2)).await.unwrap();
        create_part(&store, new_part("THM-1", "Thermocouple", 1)).await.unwrap();

        let all = list_parts(&store, None).await.unwrap();
        let names: Vec<&str> = all.iter().map(|p| p.part.name.as_str()).collect();
        assert_eq!(names, vec!["Drive belt", "Thermocouple"]);

        let found = list_parts(&store, Some("blt")).await.unwrap();
        assert_eq!(found.len(), 1);
        let found = list_parts(&store, Some("drum")).await.unwrap();
        assert_eq!(found.len(), 2);

        let counted = set_stock(&store, &belt.part.id, 12).await.unwrap();
        let inv = counted.inventory.unwrap();
        assert_eq!(inv.quantity_on_hand, 12);
        assert_eq!(inv.quantity_available, Some(12));
        assert!(inv.last_counted_at.is_some());
        assert_eq!(counted.stock_status, StockStatus::InStock);

        assert!(matches!(
            set_stock(&store, "missing", 1).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reorder_list() {
        let store = LocalStore::temporary().unwrap();
        let belt = create_part(&store, new_part("BLT-9", "Drive belt", 2)).await.unwrap();
        let probe = create_part(&store, new_part("THM-1", "Thermocouple", 1)).await.unwrap();
        set_stock(&store, &probe.part.id, 10).await.unwrap();

        let lines = reorder_list(&store).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].part_id, belt.part.id);
        assert_eq!(lines[0].suggested_quantity, 4);
        assert!((lines[0].estimated_cost - 100.0).abs() < 1e-9);
    }
}
