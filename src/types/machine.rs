//! The single tracked machine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::time::{date, date_opt, timestamp_opt};

/// Operating state shown on the machine page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MachineStatus {
    #[default]
    Operational,
    Maintenance,
    Down,
    #[serde(other)]
    Unknown,
}

/// Row of the `machine` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    pub id: String,
    pub name: String,
    pub model: String,
    pub serial_number: String,
    pub manufacturer: String,
    #[serde(with = "date")]
    pub installation_date: NaiveDate,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: MachineStatus,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(with = "timestamp_opt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp_opt", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Machine details as submitted by the machine form.
///
/// Every field is optional so the same form works as a partial update; the
/// identifying fields become mandatory only when the machine is first
/// registered (see `services::machine::save_machine`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MachineForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(with = "date_opt", default, skip_serializing_if = "Option::is_none")]
    pub installation_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MachineStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl MachineForm {
    /// Names of identifying fields that are missing or blank.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        for (name, value) in [
            ("name", &self.name),
            ("model", &self.model),
            ("serial_number", &self.serial_number),
            ("manufacturer", &self.manufacturer),
        ] {
            if super::non_blank(value.as_deref()).is_none() {
                missing.push(name);
            }
        }
        if self.installation_date.is_none() {
            missing.push("installation_date");
        }
        missing
    }
}
