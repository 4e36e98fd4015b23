//! Manually entered sensor readings for predictive maintenance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::time::{timestamp, timestamp_opt};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    Temperature,
    Vibration,
    Pressure,
    Humidity,
    Flow,
    Speed,
    Power,
    #[serde(other)]
    Unknown,
}

/// Row of the `sensor_readings` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorReading {
    pub id: String,
    pub machine_id: String,
    pub sensor_name: String,
    pub sensor_type: SensorType,
    pub reading_value: f64,
    pub unit: String,
    #[serde(default)]
    pub threshold_min: Option<f64>,
    #[serde(default)]
    pub threshold_max: Option<f64>,
    #[serde(default)]
    pub is_alarm: Option<bool>,
    #[serde(with = "timestamp")]
    pub reading_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(with = "timestamp_opt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// The "Record Sensor Reading" form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingForm {
    pub sensor_name: String,
    pub sensor_type: SensorType,
    pub reading_value: f64,
    pub unit: String,
    #[serde(default)]
    pub threshold_min: Option<f64>,
    #[serde(default)]
    pub threshold_max: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Defaults to the time of submission.
    #[serde(with = "timestamp_opt", default)]
    pub reading_timestamp: Option<DateTime<Utc>>,
}

/// Insert payload for `sensor_readings`.
#[derive(Debug, Clone, Serialize)]
pub struct NewReading {
    pub machine_id: String,
    pub sensor_name: String,
    pub sensor_type: SensorType,
    pub reading_value: f64,
    pub unit: String,
    pub threshold_min: Option<f64>,
    pub threshold_max: Option<f64>,
    pub is_alarm: bool,
    #[serde(with = "timestamp")]
    pub reading_timestamp: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    Alarm,
    Warning,
    Normal,
}

/// Reading annotated with its display status.
#[derive(Debug, Clone, Serialize)]
pub struct ReadingView {
    #[serde(flatten)]
    pub reading: SensorReading,
    pub status: ReadingStatus,
}

/// Data for the predictive maintenance page.
#[derive(Debug, Clone, Serialize)]
pub struct PredictiveOverview {
    pub active_alarms: Vec<SensorReading>,
    pub recent: Vec<ReadingView>,
}
