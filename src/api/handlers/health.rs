//! Health endpoint

use axum::extract::State;
use axum::response::Response;
use serde::Serialize;

use super::AppState;
use crate::api::envelope::ApiResponse;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Storage backend in use ("local" or "remote")
    pub backend: &'static str,
    pub auth_enabled: bool,
}

/// GET /api/v1/health
pub async fn health(State(state): State<AppState>) -> Response {
    ApiResponse::ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        backend: state.store.backend_name(),
        auth_enabled: state.auth.is_some(),
    })
}
