//! Sensor reading endpoints

use axum::extract::State;
use axum::response::Response;

use super::{respond, respond_created, AppState};
use crate::api::envelope::ApiJson;
use crate::config;
use crate::services::predictive::{self, ReadingOptions};
use crate::types::ReadingForm;

/// GET /api/v1/predictive/readings
pub async fn list_readings(State(state): State<AppState>) -> Response {
    respond(predictive::list_readings(state.store()).await)
}

/// POST /api/v1/predictive/readings
pub async fn record_reading(State(state): State<AppState>, ApiJson(form): ApiJson<ReadingForm>) -> Response {
    let options = ReadingOptions {
        alarm_alerts: config::get().alerts.sensor_alarms,
    };
    respond_created(predictive::record_reading(state.store(), form, options).await)
}

/// GET /api/v1/predictive/overview - active alarms and recent readings
pub async fn overview(State(state): State<AppState>) -> Response {
    let cfg = &config::get().predictive;
    respond(predictive::predictive_overview(state.store(), cfg.warning_band, cfg.recent_limit).await)
}
