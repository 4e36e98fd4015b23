//! Work orders.
//!
//! Creating a work order is a three-step sequence against the backend:
//! insert the maintenance record, insert one `maintenance_parts_used` row
//! per consumed part, then draw the parts down from inventory. The steps are
//! not transactional; a failure part-way leaves the earlier rows in place
//! and is reported to the caller.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use super::{alerts, machine, Problems, ServiceError, ServiceResult};
use crate::store::{self, Filter, Query, Table, TableStore};
use crate::types::{
    non_blank, AlertSeverity, MaintenanceForm, MaintenanceRecord, NewAlert,
    NewMaintenanceRecord, NewPartUsed, Part, PartInventory, PartUsed, PartUsage, WorkOrder,
    WorkOrderStatus,
};

/// Side effects of work order creation that can be switched off.
#[derive(Debug, Clone, Copy)]
pub struct WorkOrderOptions {
    /// Raise a warning alert when consumption drops a part to its reorder point
    pub low_stock_alerts: bool,
}

impl Default for WorkOrderOptions {
    fn default() -> Self {
        Self {
            low_stock_alerts: true,
        }
    }
}

/// Default work order number: `WO-<unix millis>`.
pub fn default_work_order_number() -> String {
    format!("WO-{}", Utc::now().timestamp_millis())
}

/// Create a work order from the maintenance form.
pub async fn create_work_order(
    store: &dyn TableStore,
    form: MaintenanceForm,
    options: WorkOrderOptions,
) -> ServiceResult<WorkOrder> {
    let machine_id = machine::machine_id(store).await?;

    let usages: Vec<PartUsage> = form
        .parts
        .iter()
        .filter(|u| !u.part_id.trim().is_empty())
        .map(|u| PartUsage {
            part_id: u.part_id.trim().to_string(),
            quantity: u.quantity,
        })
        .collect();

    let mut problems = Problems::new();
    problems.require("failure_description", &form.failure_description);
    if let (Some(start), Some(end)) = (form.started_at, form.completed_at) {
        problems.check(end >= start, "completed_at cannot be before started_at");
    }
    for (field, value) in [("labor_hours", form.labor_hours), ("downtime_hours", form.downtime_hours)] {
        problems.check(
            value.map_or(true, |v| v.is_finite() && v >= 0.0),
            format!("{field} must be a non-negative number"),
        );
    }
    for usage in &usages {
        problems.check(
            usage.quantity >= 1,
            format!("quantity for part {} must be at least 1", usage.part_id),
        );
    }

    let catalogue = parts_by_id(store, &usages).await?;
    for usage in &usages {
        problems.check(
            catalogue.contains_key(&usage.part_id),
            format!("unknown part {}", usage.part_id),
        );
    }
    problems.finish()?;

    let cost: f64 = usages
        .iter()
        .filter_map(|u| catalogue.get(&u.part_id).map(|p| p.unit_cost * u.quantity as f64))
        .sum();
    let status = if form.completed_at.is_some() {
        WorkOrderStatus::Completed
    } else {
        WorkOrderStatus::InProgress
    };

    let record = NewMaintenanceRecord {
        machine_id,
        work_order_number: non_blank(form.work_order_number.as_deref())
            .unwrap_or_else(default_work_order_number),
        maintenance_type: form.maintenance_type,
        priority: form.priority,
        status,
        failure_description: form.failure_description.trim().to_string(),
        root_cause: non_blank(form.root_cause.as_deref()),
        corrective_action: non_blank(form.corrective_action.as_deref()),
        labor_hours: form.labor_hours,
        downtime_hours: form.downtime_hours,
        cost,
        reported_by: non_blank(form.reported_by.as_deref()),
        assigned_to: non_blank(form.assigned_to.as_deref()),
        reported_date: Some(Utc::now()),
        started_at: form.started_at,
        completed_at: form.completed_at,
        notes: non_blank(form.notes.as_deref()),
    };
    let record: MaintenanceRecord =
        store::insert_one(store, Table::MaintenanceRecords, &record).await?;
    info!(
        work_order = %record.work_order_number,
        maintenance_type = record.maintenance_type.as_str(),
        status = record.status.as_str(),
        cost,
        "Work order created"
    );

    let lines: Vec<NewPartUsed> = usages
        .iter()
        .filter_map(|u| {
            let part = catalogue.get(&u.part_id)?;
            Some(NewPartUsed {
                maintenance_record_id: record.id.clone(),
                part_id: u.part_id.clone(),
                quantity_used: u.quantity,
                cost_per_unit: part.unit_cost,
                total_cost: part.unit_cost * u.quantity as f64,
            })
        })
        .collect();
    let parts_used: Vec<PartUsed> =
        store::insert_many(store, Table::MaintenancePartsUsed, &lines).await?;

    for usage in &usages {
        if let Some(part) = catalogue.get(&usage.part_id) {
            draw_down(store, part, usage.quantity, &record, options).await?;
        }
    }

    Ok(WorkOrder { record, parts_used })
}

async fn parts_by_id(
    store: &dyn TableStore,
    usages: &[PartUsage],
) -> ServiceResult<HashMap<String, Part>> {
    if usages.is_empty() {
        return Ok(HashMap::new());
    }
    let ids: Vec<&str> = usages.iter().map(|u| u.part_id.as_str()).collect();
    let parts: Vec<Part> =
        store::fetch(store, Table::Parts, &Query::new().in_list("id", ids)).await?;
    Ok(parts.into_iter().map(|p| (p.id.clone(), p)).collect())
}

/// Take `quantity` of `part` out of inventory, never going below zero.
async fn draw_down(
    store: &dyn TableStore,
    part: &Part,
    quantity: i64,
    record: &MaintenanceRecord,
    options: WorkOrderOptions,
) -> ServiceResult<()> {
    let Some(inventory) = super::parts::inventory_for(store, &part.id).await? else {
        warn!(part = %part.part_number, "No inventory row; stock not adjusted");
        return Ok(());
    };

    let on_hand = (inventory.quantity_on_hand - quantity).max(0);
    let available = (on_hand - inventory.quantity_reserved).max(0);
    let _: Vec<PartInventory> = store::update_where(
        store,
        Table::PartInventory,
        &[Filter::eq("id", inventory.id.as_str())],
        &json!({ "quantity_on_hand": on_hand, "quantity_available": available }),
    )
    .await?;

    let crossed = inventory.available() > part.reorder_point && available <= part.reorder_point;
    if options.low_stock_alerts && crossed {
        let alert = NewAlert::new(
            alerts::LOW_STOCK,
            AlertSeverity::Warning,
            format!("Low stock: {}", part.name),
            format!(
                "{} ({}) is down to {available} after {}; reorder point is {}",
                part.name, part.part_number, record.work_order_number, part.reorder_point
            ),
        )
        .related_to("part", &part.id);
        alerts::raise_best_effort(store, alert).await;
    }
    Ok(())
}

/// Work orders, newest report first, optionally filtered by status.
pub async fn list_work_orders(
    store: &dyn TableStore,
    status: Option<WorkOrderStatus>,
) -> ServiceResult<Vec<MaintenanceRecord>> {
    let mut query = Query::new()
        .order_by("reported_date", false)
        .order_by("created_at", false);
    if let Some(status) = status {
        query = query.eq("status", status.as_str());
    }
    Ok(store::fetch(store, Table::MaintenanceRecords, &query).await?)
}

/// A work order with the parts booked against it.
pub async fn get_work_order(store: &dyn TableStore, id: &str) -> ServiceResult<WorkOrder> {
    let record: MaintenanceRecord =
        store::fetch_optional(store, Table::MaintenanceRecords, &Query::new().eq("id", id))
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("work order {id}")))?;
    let parts_used: Vec<PartUsed> = store::fetch(
        store,
        Table::MaintenancePartsUsed,
        &Query::new()
            .eq("maintenance_record_id", id)
            .order_by("created_at", true),
    )
    .await?;
    Ok(WorkOrder { record, parts_used })
}

/// Move a work order to a new status. Completing stamps `completed_at`
/// unless the order already has one.
pub async fn update_status(
    store: &dyn TableStore,
    id: &str,
    status: WorkOrderStatus,
    completed_at: Option<chrono::DateTime<Utc>>,
) -> ServiceResult<MaintenanceRecord> {
    if status == WorkOrderStatus::Unknown {
        return Err(ServiceError::Validation("unknown work order status".into()));
    }
    let current = get_work_order(store, id).await?.record;

    let mut patch = json!({ "status": status.as_str() });
    if status == WorkOrderStatus::Completed {
        let stamp = completed_at.or(current.completed_at).unwrap_or_else(Utc::now);
        if current.started_at.is_some_and(|start| stamp < start) {
            return Err(ServiceError::Validation(
                "completed_at cannot be before started_at".into(),
            ));
        }
        patch["completed_at"] = json!(stamp.to_rfc3339());
    }

    let mut updated: Vec<MaintenanceRecord> = store::update_where(
        store,
        Table::MaintenanceRecords,
        &[Filter::eq("id", id)],
        &patch,
    )
    .await?;
    let record = updated
        .pop()
        .ok_or_else(|| ServiceError::NotFound(format!("work order {id}")))?;
    info!(work_order = %record.work_order_number, status = status.as_str(), "Work order status changed");
    Ok(record)
}
