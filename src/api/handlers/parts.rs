//! Parts and inventory endpoints

use axum::extract::{Path, Query, State};
use axum::response::Response;

use super::{respond, respond_created, AppState, SearchParams};
use crate::api::envelope::ApiJson;
use crate::services::parts;
use crate::types::{NewPart, StockCount};

/// GET /api/v1/parts?search=
pub async fn list_parts(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    respond(parts::list_parts(state.store(), params.search.as_deref()).await)
}

/// POST /api/v1/parts - create a part with an empty inventory row
pub async fn create_part(State(state): State<AppState>, ApiJson(form): ApiJson<NewPart>) -> Response {
    respond_created(parts::create_part(state.store(), form).await)
}

/// GET /api/v1/parts/reorder
pub async fn reorder_list(State(state): State<AppState>) -> Response {
    respond(parts::reorder_list(state.store()).await)
}

/// PUT /api/v1/parts/:id/stock
pub async fn set_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(count): ApiJson<StockCount>,
) -> Response {
    respond(parts::set_stock(state.store(), &id, count.quantity).await)
}
