//! Work order endpoints

use axum::extract::{Path, Query, State};
use axum::response::Response;
use serde::Deserialize;

use super::{respond, respond_created, AppState};
use crate::api::envelope::{ApiErrorResponse, ApiJson};
use crate::config;
use crate::services::maintenance::{self, WorkOrderOptions};
use crate::types::{MaintenanceForm, WorkOrderStatus, WorkOrderStatusChange};

#[derive(Debug, Default, Deserialize)]
pub struct StatusParams {
    pub status: Option<String>,
}

/// Parse the `?status=` filter. Blank means "all".
fn parse_status(raw: Option<&str>) -> Result<Option<WorkOrderStatus>, Response> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    match serde_json::from_value(serde_json::Value::String(raw.to_string())) {
        Ok(WorkOrderStatus::Unknown) | Err(_) => Err(ApiErrorResponse::bad_request(format!(
            "unknown work order status '{raw}'"
        ))),
        Ok(status) => Ok(Some(status)),
    }
}

/// GET /api/v1/maintenance?status=
pub async fn list_work_orders(State(state): State<AppState>, Query(params): Query<StatusParams>) -> Response {
    let status = match parse_status(params.status.as_deref()) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    respond(maintenance::list_work_orders(state.store(), status).await)
}

/// POST /api/v1/maintenance - create a work order and book its parts
pub async fn create_work_order(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<MaintenanceForm>,
) -> Response {
    let options = WorkOrderOptions {
        low_stock_alerts: config::get().alerts.low_stock,
    };
    respond_created(maintenance::create_work_order(state.store(), form, options).await)
}

/// GET /api/v1/maintenance/:id
pub async fn get_work_order(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    respond(maintenance::get_work_order(state.store(), &id).await)
}

/// PATCH /api/v1/maintenance/:id/status
pub async fn update_work_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(change): ApiJson<WorkOrderStatusChange>,
) -> Response {
    respond(maintenance::update_status(state.store(), &id, change.status, change.completed_at).await)
}
