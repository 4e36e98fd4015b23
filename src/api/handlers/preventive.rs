//! Preventive schedule and calendar endpoints

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use serde::Deserialize;
use serde_json::json;

use super::{respond, respond_created, today, AppState};
use crate::api::envelope::{ApiErrorResponse, ApiJson};
use crate::config;
use crate::services::{calendar, preventive};
use crate::types::time::parse_date;
use crate::types::{PerformedRequest, ScheduleForm, ScheduleUpdate};

/// GET /api/v1/preventive - schedules with due state for today
pub async fn list_schedules(State(state): State<AppState>) -> Response {
    let due_soon_days = config::get().preventive.due_soon_days;
    respond(preventive::list_schedules(state.store(), today(), due_soon_days).await)
}

/// POST /api/v1/preventive
pub async fn create_schedule(State(state): State<AppState>, ApiJson(form): ApiJson<ScheduleForm>) -> Response {
    respond_created(preventive::create_schedule(state.store(), form).await)
}

/// PATCH /api/v1/preventive/:id
pub async fn update_schedule(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ScheduleUpdate>,
) -> Response {
    respond(preventive::update_schedule(state.store(), &id, update).await)
}

/// DELETE /api/v1/preventive/:id
pub async fn delete_schedule(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    respond(
        preventive::delete_schedule(state.store(), &id)
            .await
            .map(|()| json!({ "deleted": id })),
    )
}

/// POST /api/v1/preventive/:id/performed
///
/// The body is optional; without `performed_on` the task counts as done
/// today.
pub async fn record_performed(State(state): State<AppState>, Path(id): Path<String>, body: Bytes) -> Response {
    let request: PerformedRequest = if body.iter().all(u8::is_ascii_whitespace) {
        PerformedRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(r) => r,
            Err(e) => return ApiErrorResponse::bad_request(format!("invalid body: {e}")),
        }
    };
    let performed_on = request.performed_on.unwrap_or_else(today);
    respond(preventive::record_performed(state.store(), &id, performed_on).await)
}

#[derive(Debug, Default, Deserialize)]
pub struct DateParams {
    pub date: Option<String>,
}

/// GET /api/v1/schedule?date=YYYY-MM-DD - calendar for one day
pub async fn get_calendar(State(state): State<AppState>, Query(params): Query<DateParams>) -> Response {
    let date = match params.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        None => today(),
        Some(raw) => match parse_date(raw) {
            Some(d) => d,
            None => return ApiErrorResponse::bad_request(format!("invalid date '{raw}'")),
        },
    };
    respond(calendar::calendar(state.store(), date).await)
}
