//! Machine profile and dashboard endpoints

use axum::extract::State;
use axum::response::Response;

use super::{respond, AppState};
use crate::api::envelope::ApiJson;
use crate::config;
use crate::services::{dashboard, machine};
use crate::types::MachineForm;

/// GET /api/v1/machine
pub async fn get_machine(State(state): State<AppState>) -> Response {
    respond(machine::get_machine(state.store()).await)
}

/// PUT /api/v1/machine - register the roaster or update its profile
pub async fn save_machine(State(state): State<AppState>, ApiJson(form): ApiJson<MachineForm>) -> Response {
    respond(machine::save_machine(state.store(), form).await)
}

/// GET /api/v1/dashboard - KPI cards over the configured period
pub async fn get_dashboard(State(state): State<AppState>) -> Response {
    let period_hours = config::get().kpi.period_hours;
    respond(dashboard::load_dashboard(state.store(), period_hours).await)
}
