//! Alert endpoints

use axum::extract::{Path, State};
use axum::response::Response;

use super::{respond, AppState};
use crate::services::alerts;

/// GET /api/v1/alerts - active and resolved alerts with unread count
pub async fn list_alerts(State(state): State<AppState>) -> Response {
    respond(alerts::list_alerts(state.store()).await)
}

/// POST /api/v1/alerts/:id/read
pub async fn mark_read(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    respond(alerts::mark_read(state.store(), &id).await)
}

/// POST /api/v1/alerts/:id/resolve
pub async fn resolve(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    respond(alerts::resolve(state.store(), &id).await)
}
