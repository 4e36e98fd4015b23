//! Purchase orders.

use chrono::NaiveDate;
use serde_json::json;
use tracing::{info, warn};

use super::{Problems, ServiceError, ServiceResult};
use crate::store::{self, Filter, Query, Table, TableStore};
use crate::types::{
    non_blank, NewInventory, NewPurchaseOrder, PartInventory, PendingSummary, PurchaseOrder,
    PurchaseOrderForm, PurchaseStatus,
};

/// Orders, most recent order date first.
pub async fn list_orders(store: &dyn TableStore) -> ServiceResult<Vec<PurchaseOrder>> {
    Ok(store::fetch(
        store,
        Table::PurchaseOrders,
        &Query::new()
            .order_by("order_date", false)
            .order_by("created_at", false),
    )
    .await?)
}

async fn exists(store: &dyn TableStore, table: Table, id: &str) -> ServiceResult<bool> {
    Ok(!store
        .select(table, &Query::new().eq("id", id).limit(1))
        .await?
        .is_empty())
}

/// Create a pending order; total price is quantity times unit price.
pub async fn create_order(
    store: &dyn TableStore,
    form: PurchaseOrderForm,
) -> ServiceResult<PurchaseOrder> {
    let mut problems = Problems::new();
    problems.require("po_number", &form.po_number);
    problems.require("part_id", &form.part_id);
    problems.require("vendor_id", &form.vendor_id);
    problems.check(form.quantity >= 1, "quantity must be at least 1");
    problems.check(
        form.unit_price.is_finite() && form.unit_price >= 0.0,
        "unit_price must be a non-negative number",
    );
    if let Some(expected) = form.expected_delivery_date {
        problems.check(
            expected >= form.order_date,
            "expected_delivery_date cannot be before order_date",
        );
    }
    problems.finish()?;

    let part_id = form.part_id.trim().to_string();
    let vendor_id = form.vendor_id.trim().to_string();
    let mut problems = Problems::new();
    problems.check(exists(store, Table::Parts, &part_id).await?, format!("unknown part {part_id}"));
    problems.check(
        exists(store, Table::Vendors, &vendor_id).await?,
        format!("unknown vendor {vendor_id}"),
    );
    problems.finish()?;

    let row = NewPurchaseOrder {
        po_number: form.po_number.trim().to_string(),
        part_id,
        vendor_id,
        order_date: form.order_date,
        expected_delivery_date: form.expected_delivery_date,
        status: PurchaseStatus::Pending,
        quantity: form.quantity,
        unit_price: form.unit_price,
        total_price: form.quantity as f64 * form.unit_price,
        notes: non_blank(form.notes.as_deref()),
    };
    let order: PurchaseOrder = store::insert_one(store, Table::PurchaseOrders, &row).await?;
    info!(po = %order.po_number, total = row.total_price, "Purchase order created");
    Ok(order)
}

/// Change an order's status. Delivery stamps `actual_delivery_date` with
/// `today` and, the first time an order is delivered, books its quantity
/// into the part's inventory.
pub async fn update_status(
    store: &dyn TableStore,
    id: &str,
    status: PurchaseStatus,
    today: NaiveDate,
) -> ServiceResult<PurchaseOrder> {
    if status == PurchaseStatus::Unknown {
        return Err(ServiceError::Validation("unknown purchase order status".into()));
    }
    let current: PurchaseOrder =
        store::fetch_optional(store, Table::PurchaseOrders, &Query::new().eq("id", id))
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("purchase order {id}")))?;

    let status_value = serde_json::to_value(status).map_err(crate::store::StoreError::from)?;
    let mut patch = json!({ "status": status_value });
    let newly_delivered =
        status == PurchaseStatus::Delivered && current.status != PurchaseStatus::Delivered;
    if status == PurchaseStatus::Delivered {
        patch["actual_delivery_date"] = json!(today.format("%Y-%m-%d").to_string());
    }

    let mut updated: Vec<PurchaseOrder> = store::update_where(
        store,
        Table::PurchaseOrders,
        &[Filter::eq("id", id)],
        &patch,
    )
    .await?;
    let order = updated
        .pop()
        .ok_or_else(|| ServiceError::NotFound(format!("purchase order {id}")))?;
    info!(po = %order.po_number, status = ?status, "Purchase order status changed");

    if newly_delivered {
        if let Some(part_id) = order.part_id.as_deref() {
            receive_stock(store, part_id, order.quantity).await?;
        } else {
            warn!(po = %order.po_number, "Delivered order has no part; stock not adjusted");
        }
    }
    Ok(order)
}

async fn receive_stock(store: &dyn TableStore, part_id: &str, quantity: i64) -> ServiceResult<()> {
    match super::parts::inventory_for(store, part_id).await? {
        Some(inv) => {
            let on_hand = inv.quantity_on_hand + quantity;
            let available = (on_hand - inv.quantity_reserved).max(0);
            let _: Vec<PartInventory> = store::update_where(
                store,
                Table::PartInventory,
                &[Filter::eq("id", inv.id.as_str())],
                &json!({ "quantity_on_hand": on_hand, "quantity_available": available }),
            )
            .await?;
        }
        None => {
            let row = NewInventory {
                quantity_on_hand: quantity,
                quantity_available: quantity,
                ..NewInventory::empty(part_id)
            };
            let _: PartInventory = store::insert_one(store, Table::PartInventory, &row).await?;
        }
    }
    info!(part = %part_id, quantity, "Delivered stock received");
    Ok(())
}

/// Count and value of pending orders.
pub fn pending_summary(orders: &[PurchaseOrder]) -> PendingSummary {
    let pending: Vec<&PurchaseOrder> = orders
        .iter()
        .filter(|o| o.status == PurchaseStatus::Pending)
        .collect();
    PendingSummary {
        pending_orders: pending.len(),
        pending_value: pending.iter().map(|o| o.total_price.unwrap_or(0.0)).sum(),
    }
}

pub async fn load_pending_summary(store: &dyn TableStore) -> ServiceResult<PendingSummary> {
    Ok(pending_summary(&list_orders(store).await?))
}
