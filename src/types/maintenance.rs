//! Work orders (maintenance records) and the parts consumed by them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::time::{date_opt, timestamp_opt};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceType {
    /// Repair after a failure. Only these count towards MTBF.
    #[default]
    Corrective,
    Preventive,
    Predictive,
    #[serde(other)]
    Unknown,
}

impl MaintenanceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Corrective => "corrective",
            Self::Preventive => "preventive",
            Self::Predictive => "predictive",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    #[default]
    Open,
    InProgress,
    Completed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl WorkOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }
}

/// Row of the `maintenance_records` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    pub id: String,
    pub machine_id: String,
    pub work_order_number: String,
    pub maintenance_type: MaintenanceType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: WorkOrderStatus,
    #[serde(default)]
    pub failure_description: Option<String>,
    #[serde(default)]
    pub root_cause: Option<String>,
    #[serde(default)]
    pub corrective_action: Option<String>,
    #[serde(default)]
    pub labor_hours: Option<f64>,
    #[serde(default)]
    pub downtime_hours: Option<f64>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub parts_replaced: Option<String>,
    #[serde(default)]
    pub reported_by: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(with = "timestamp_opt", default)]
    pub reported_date: Option<DateTime<Utc>>,
    #[serde(with = "timestamp_opt", default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp_opt", default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(with = "date_opt", default)]
    pub next_maintenance_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(with = "timestamp_opt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp_opt", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl MaintenanceRecord {
    /// Hours between start and completion, when both are recorded.
    pub fn repair_hours(&self) -> Option<f64> {
        let (start, end) = (self.started_at?, self.completed_at?);
        Some((end - start).num_milliseconds() as f64 / 3_600_000.0)
    }
}

/// One line of the "parts used" section of the work order form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartUsage {
    #[serde(default)]
    pub part_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

/// The "New Maintenance" form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaintenanceForm {
    /// Defaults to `WO-<unix millis>` when blank.
    #[serde(default)]
    pub work_order_number: Option<String>,
    #[serde(default)]
    pub maintenance_type: MaintenanceType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub failure_description: String,
    #[serde(default)]
    pub root_cause: Option<String>,
    #[serde(default)]
    pub corrective_action: Option<String>,
    #[serde(default)]
    pub labor_hours: Option<f64>,
    #[serde(default)]
    pub downtime_hours: Option<f64>,
    #[serde(default)]
    pub reported_by: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(with = "timestamp_opt", default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp_opt", default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub parts: Vec<PartUsage>,
}

/// Insert payload for `maintenance_records`.
#[derive(Debug, Clone, Serialize)]
pub struct NewMaintenanceRecord {
    pub machine_id: String,
    pub work_order_number: String,
    pub maintenance_type: MaintenanceType,
    pub priority: Priority,
    pub status: WorkOrderStatus,
    pub failure_description: String,
    pub root_cause: Option<String>,
    pub corrective_action: Option<String>,
    pub labor_hours: Option<f64>,
    pub downtime_hours: Option<f64>,
    pub cost: f64,
    pub reported_by: Option<String>,
    pub assigned_to: Option<String>,
    #[serde(with = "timestamp_opt")]
    pub reported_date: Option<DateTime<Utc>>,
    #[serde(with = "timestamp_opt")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp_opt")]
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Row of the `maintenance_parts_used` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartUsed {
    pub id: String,
    pub maintenance_record_id: String,
    pub part_id: String,
    #[serde(default)]
    pub quantity_used: i64,
    #[serde(default)]
    pub cost_per_unit: f64,
    #[serde(default)]
    pub total_cost: Option<f64>,
    #[serde(with = "timestamp_opt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert payload for `maintenance_parts_used`.
#[derive(Debug, Clone, Serialize)]
pub struct NewPartUsed {
    pub maintenance_record_id: String,
    pub part_id: String,
    pub quantity_used: i64,
    pub cost_per_unit: f64,
    pub total_cost: f64,
}

/// A work order together with the parts booked against it.
#[derive(Debug, Clone, Serialize)]
pub struct WorkOrder {
    #[serde(flatten)]
    pub record: MaintenanceRecord,
    pub parts_used: Vec<PartUsed>,
}

/// Status change request for an existing work order.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkOrderStatusChange {
    pub status: WorkOrderStatus,
    #[serde(with = "timestamp_opt", default)]
    pub completed_at: Option<DateTime<Utc>>,
}
