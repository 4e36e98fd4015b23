//! REST API module using Axum
//!
//! Provides the JSON endpoints behind the maintenance pages under `/api/v1`.
//! Every response uses the envelope in [`envelope`]; data routes sit behind
//! the session check in [`middleware`] when authentication is enabled.

pub mod envelope;
pub mod handlers;
pub mod middleware;
mod routes;

pub use handlers::AppState;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::config;

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// `server.cors_origins` lists the origins allowed to call the API, for
/// example a separately served frontend during development.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| o.trim().parse().ok())
        .collect();
    if allowed.is_empty() {
        base
    } else {
        tracing::info!(origins = ?origins, "CORS: allowing configured origins");
        base.allow_origin(allowed)
    }
}

/// Create the complete application router.
pub fn create_app(state: AppState) -> Router {
    let server = &config::get().server;

    Router::new()
        .nest("/api/v1", routes::api_routes(state.clone()))
        .merge(routes::legacy_routes(state))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&server.cors_origins))
}

