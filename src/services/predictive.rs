//! Sensor readings and threshold alarms.
//!
//! Readings are entered by hand and compared against the static min/max
//! thresholds submitted with them. A reading outside its thresholds is an
//! alarm; one within `band` of a threshold is shown as a warning.

use chrono::Utc;
use tracing::info;

use super::{alerts, machine, Problems, ServiceResult};
use crate::store::{self, Query, Table, TableStore};
use crate::types::{
    non_blank, AlertSeverity, NewAlert, NewReading, PredictiveOverview, ReadingForm,
    ReadingStatus, ReadingView, SensorReading, SensorType,
};

/// True when `value` is below a set minimum or above a set maximum.
pub fn is_alarm(value: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.is_some_and(|m| value < m) || max.is_some_and(|m| value > m)
}

/// Display status of a stored reading.
pub fn reading_status(reading: &SensorReading, band: f64) -> ReadingStatus {
    let value = reading.reading_value;
    if reading.is_alarm.unwrap_or(false) {
        ReadingStatus::Alarm
    } else if reading.threshold_min.is_some_and(|min| value < min * (1.0 + band))
        || reading.threshold_max.is_some_and(|max| value > max * (1.0 - band))
    {
        ReadingStatus::Warning
    } else {
        ReadingStatus::Normal
    }
}

/// Options for recording a reading.
#[derive(Debug, Clone, Copy)]
pub struct ReadingOptions {
    /// Raise a critical alert for alarm readings
    pub alarm_alerts: bool,
}

impl Default for ReadingOptions {
    fn default() -> Self {
        Self { alarm_alerts: true }
    }
}

pub async fn record_reading(
    store: &dyn TableStore,
    form: ReadingForm,
    options: ReadingOptions,
) -> ServiceResult<SensorReading> {
    let mut problems = Problems::new();
    problems.require("sensor_name", &form.sensor_name);
    problems.require("unit", &form.unit);
    problems.check(form.sensor_type != SensorType::Unknown, "unknown sensor_type");
    problems.check(form.reading_value.is_finite(), "reading_value must be a number");
    for (field, value) in [("threshold_min", form.threshold_min), ("threshold_max", form.threshold_max)] {
        problems.check(value.map_or(true, f64::is_finite), format!("{field} must be a number"));
    }
    if let (Some(min), Some(max)) = (form.threshold_min, form.threshold_max) {
        problems.check(min <= max, "threshold_min cannot exceed threshold_max");
    }
    problems.finish()?;

    let machine_id = machine::machine_id(store).await?;
    let alarm = is_alarm(form.reading_value, form.threshold_min, form.threshold_max);
    let row = NewReading {
        machine_id,
        sensor_name: form.sensor_name.trim().to_string(),
        sensor_type: form.sensor_type,
        reading_value: form.reading_value,
        unit: form.unit.trim().to_string(),
        threshold_min: form.threshold_min,
        threshold_max: form.threshold_max,
        is_alarm: alarm,
        reading_timestamp: form.reading_timestamp.unwrap_or_else(Utc::now),
        notes: non_blank(form.notes.as_deref()),
    };
    let reading: SensorReading = store::insert_one(store, Table::SensorReadings, &row).await?;
    info!(sensor = %reading.sensor_name, value = reading.reading_value, alarm, "Sensor reading recorded");

    if alarm && options.alarm_alerts {
        let limits = match (reading.threshold_min, reading.threshold_max) {
            (Some(min), Some(max)) => format!("{min} - {max}"),
            (Some(min), None) => format!(">= {min}"),
            (None, Some(max)) => format!("<= {max}"),
            (None, None) => String::new(),
        };
        let alert = NewAlert::new(
            alerts::SENSOR_ALARM,
            AlertSeverity::Critical,
            format!("Sensor alarm: {}", reading.sensor_name),
            format!(
                "{} read {} {} (limits {limits} {})",
                reading.sensor_name, reading.reading_value, reading.unit, reading.unit
            ),
        )
        .related_to("sensor_reading", &reading.id);
        alerts::raise_best_effort(store, alert).await;
    }
    Ok(reading)
}

/// All readings, newest first.
pub async fn list_readings(store: &dyn TableStore) -> ServiceResult<Vec<SensorReading>> {
    Ok(store::fetch(
        store,
        Table::SensorReadings,
        &Query::new().order_by("reading_timestamp", false),
    )
    .await?)
}

/// Alarm readings and the latest `recent_limit` readings with status.
pub async fn predictive_overview(
    store: &dyn TableStore,
    band: f64,
    recent_limit: usize,
) -> ServiceResult<PredictiveOverview> {
    let readings = list_readings(store).await?;
    let active_alarms = readings
        .iter()
        .filter(|r| r.is_alarm.unwrap_or(false))
        .cloned()
        .collect();
    let recent = readings
        .into_iter()
        .take(recent_limit)
        .map(|reading| ReadingView {
            status: reading_status(&reading, band),
            reading,
        })
        .collect();
    Ok(PredictiveOverview {
        active_alarms,
        recent,
    })
}
