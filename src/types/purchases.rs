//! Purchase orders for spare parts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::time::{date, date_opt, timestamp_opt};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    #[default]
    Pending,
    Ordered,
    Delivered,
    Cancelled,
    #[serde(other)]
    Unknown,
}

/// Row of the `purchase_orders` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: String,
    pub po_number: String,
    #[serde(default)]
    pub part_id: Option<String>,
    #[serde(default)]
    pub vendor_id: Option<String>,
    #[serde(with = "date")]
    pub order_date: NaiveDate,
    #[serde(with = "date_opt", default)]
    pub expected_delivery_date: Option<NaiveDate>,
    #[serde(with = "date_opt", default)]
    pub actual_delivery_date: Option<NaiveDate>,
    pub quantity: i64,
    pub unit_price: f64,
    #[serde(default)]
    pub total_price: Option<f64>,
    #[serde(default)]
    pub status: PurchaseStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(with = "timestamp_opt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp_opt", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// The "Create Purchase Order" form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderForm {
    pub po_number: String,
    pub part_id: String,
    pub vendor_id: String,
    #[serde(with = "date")]
    pub order_date: NaiveDate,
    #[serde(with = "date_opt", default)]
    pub expected_delivery_date: Option<NaiveDate>,
    pub quantity: i64,
    pub unit_price: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Insert payload for `purchase_orders`.
#[derive(Debug, Clone, Serialize)]
pub struct NewPurchaseOrder {
    pub po_number: String,
    pub part_id: String,
    pub vendor_id: String,
    #[serde(with = "date")]
    pub order_date: NaiveDate,
    #[serde(with = "date_opt")]
    pub expected_delivery_date: Option<NaiveDate>,
    pub status: PurchaseStatus,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_price: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PurchaseStatusChange {
    pub status: PurchaseStatus,
}

/// Pending-orders card on the purchases page.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct PendingSummary {
    pub pending_orders: usize,
    pub pending_value: f64,
}
