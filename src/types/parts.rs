//! Spare parts catalogue and stock levels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::time::timestamp_opt;

/// Row of the `parts` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub id: String,
    pub part_number: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    #[serde(default = "default_unit_of_measure")]
    pub unit_of_measure: String,
    #[serde(default)]
    pub unit_cost: f64,
    #[serde(default)]
    pub min_stock_level: i64,
    #[serde(default)]
    pub reorder_point: i64,
    #[serde(default)]
    pub reorder_quantity: i64,
    #[serde(default)]
    pub lead_time_days: i64,
    #[serde(default)]
    pub specifications: Option<String>,
    #[serde(default)]
    pub supplier_part_number: Option<String>,
    #[serde(with = "timestamp_opt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp_opt", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_unit_of_measure() -> String {
    "unit".to_string()
}

/// Part creation form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPart {
    pub part_number: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    #[serde(default = "default_unit_of_measure")]
    pub unit_of_measure: String,
    #[serde(default)]
    pub unit_cost: f64,
    #[serde(default)]
    pub min_stock_level: i64,
    #[serde(default)]
    pub reorder_point: i64,
    #[serde(default)]
    pub reorder_quantity: i64,
    #[serde(default)]
    pub lead_time_days: i64,
    #[serde(default)]
    pub specifications: Option<String>,
    #[serde(default)]
    pub supplier_part_number: Option<String>,
}

impl NewPart {
    /// Trim text fields, blank optionals to `None`, and list every problem found.
    pub fn normalize(mut self) -> Result<Self, Vec<String>> {
        let mut problems = Vec::new();

        self.part_number = self.part_number.trim().to_string();
        self.name = self.name.trim().to_string();
        self.category = self.category.trim().to_string();
        self.unit_of_measure = super::non_blank(Some(&self.unit_of_measure))
            .unwrap_or_else(default_unit_of_measure);
        self.description = super::non_blank(self.description.as_deref());
        self.specifications = super::non_blank(self.specifications.as_deref());
        self.supplier_part_number = super::non_blank(self.supplier_part_number.as_deref());

        for (field, value) in [
            ("part_number", &self.part_number),
            ("name", &self.name),
            ("category", &self.category),
        ] {
            if value.is_empty() {
                problems.push(format!("{field} is required"));
            }
        }
        if !self.unit_cost.is_finite() || self.unit_cost < 0.0 {
            problems.push("unit_cost must be a non-negative number".to_string());
        }
        for (field, value) in [
            ("min_stock_level", self.min_stock_level),
            ("reorder_point", self.reorder_point),
            ("reorder_quantity", self.reorder_quantity),
            ("lead_time_days", self.lead_time_days),
        ] {
            if value < 0 {
                problems.push(format!("{field} cannot be negative"));
            }
        }

        if problems.is_empty() {
            Ok(self)
        } else {
            Err(problems)
        }
    }
}

/// Row of the `part_inventory` table (one per part).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartInventory {
    pub id: String,
    pub part_id: String,
    #[serde(default)]
    pub quantity_on_hand: i64,
    #[serde(default)]
    pub quantity_reserved: i64,
    #[serde(default)]
    pub quantity_available: Option<i64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(with = "timestamp_opt", default)]
    pub last_counted_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp_opt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp_opt", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PartInventory {
    /// Quantity free for use; falls back to on-hand minus reserved when the
    /// backend left the column null.
    pub fn available(&self) -> i64 {
        self.quantity_available
            .unwrap_or(self.quantity_on_hand - self.quantity_reserved)
    }
}

/// Insert payload for a fresh inventory row.
#[derive(Debug, Clone, Serialize)]
pub struct NewInventory {
    pub part_id: String,
    pub quantity_on_hand: i64,
    pub quantity_reserved: i64,
    pub quantity_available: i64,
}

impl NewInventory {
    pub fn empty(part_id: &str) -> Self {
        Self {
            part_id: part_id.to_string(),
            quantity_on_hand: 0,
            quantity_reserved: 0,
            quantity_available: 0,
        }
    }
}

/// Stock badge shown next to each part.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    NoData,
    OutOfStock,
    LowStock,
    InStock,
}

impl StockStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoData => "No Data",
            Self::OutOfStock => "Out of Stock",
            Self::LowStock => "Low Stock",
            Self::InStock => "In Stock",
        }
    }
}

/// A part joined with its inventory row and derived stock status.
#[derive(Debug, Clone, Serialize)]
pub struct PartWithStock {
    #[serde(flatten)]
    pub part: Part,
    pub inventory: Option<PartInventory>,
    pub stock_status: StockStatus,
    pub needs_reorder: bool,
}

/// Counted stock submitted from the inventory edit dialog.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StockCount {
    pub quantity: i64,
}

/// Reorder suggestion for a part at or below its reorder point.
#[derive(Debug, Clone, Serialize)]
pub struct ReorderLine {
    pub part_id: String,
    pub part_number: String,
    pub name: String,
    pub available: i64,
    pub reorder_point: i64,
    pub suggested_quantity: i64,
    pub lead_time_days: i64,
    pub estimated_cost: f64,
}
