//! Row and form types for the maintenance tables
//!
//! Every struct serializes with the exact column names of the hosted schema:
//! - `machine`: the one tracked machine
//! - `parts` / `part_inventory`: spare parts and their stock levels
//! - `maintenance_records` / `maintenance_parts_used`: work orders
//! - `preventive_schedules`: recurring tasks
//! - `sensor_readings`: manually entered measurements
//! - `vendors` / `purchase_orders`: procurement
//! - `alerts`: notifications
//!
//! Row types (`Part`, `Alert`, ...) mirror what the backend returns; form
//! types (`NewPart`, `MaintenanceForm`, ...) are what the API accepts;
//! `New*` payloads are what gets inserted.

pub mod time;
mod machine;
mod parts;
mod maintenance;
mod preventive;
mod sensors;
mod vendors;
mod purchases;
mod alerts;

pub use machine::*;
pub use parts::*;
pub use maintenance::*;
pub use preventive::*;
pub use sensors::*;
pub use vendors::*;
pub use purchases::*;
pub use alerts::*;

/// Trim a form value, mapping blank input to `None`.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
