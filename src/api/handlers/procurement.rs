//! Vendor and purchase order endpoints

use axum::extract::{Path, Query, State};
use axum::response::Response;
use serde_json::json;

use super::{respond, respond_created, today, AppState, SearchParams};
use crate::api::envelope::ApiJson;
use crate::services::{purchases, vendors};
use crate::types::{PurchaseOrderForm, PurchaseStatusChange, VendorForm};

// ============================================================================
// Vendors
// ============================================================================

/// GET /api/v1/vendors?search=
pub async fn list_vendors(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    respond(vendors::list_vendors(state.store(), params.search.as_deref()).await)
}

/// POST /api/v1/vendors
pub async fn create_vendor(State(state): State<AppState>, ApiJson(form): ApiJson<VendorForm>) -> Response {
    respond_created(vendors::create_vendor(state.store(), form).await)
}

/// DELETE /api/v1/vendors/:id
pub async fn delete_vendor(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    respond(
        vendors::delete_vendor(state.store(), &id)
            .await
            .map(|()| json!({ "deleted": id })),
    )
}

// ============================================================================
// Purchase orders
// ============================================================================

/// GET /api/v1/purchases
pub async fn list_orders(State(state): State<AppState>) -> Response {
    respond(purchases::list_orders(state.store()).await)
}

/// POST /api/v1/purchases
pub async fn create_order(State(state): State<AppState>, ApiJson(form): ApiJson<PurchaseOrderForm>) -> Response {
    respond_created(purchases::create_order(state.store(), form).await)
}

/// GET /api/v1/purchases/summary - pending order count and value
pub async fn pending_summary(State(state): State<AppState>) -> Response {
    respond(purchases::load_pending_summary(state.store()).await)
}

/// PATCH /api/v1/purchases/:id/status
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(change): ApiJson<PurchaseStatusChange>,
) -> Response {
    respond(purchases::update_status(state.store(), &id, change.status, today()).await)
}
