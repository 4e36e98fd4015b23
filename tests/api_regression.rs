//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` over a
//! temporary local store and exercise the /api/v1/* endpoints using
//! `tower::ServiceExt::oneshot()`. No binary spawn, no network port.

use roaster_cmms::api::{create_app, AppState};
use roaster_cmms::store::LocalStore;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn create_test_state() -> AppState {
    AppState::new(Arc::new(LocalStore::temporary().unwrap()), None)
}

async fn call(state: &AppState, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = create_app(state.clone()).oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// All list endpoints answer 200 on an empty store.
#[tokio::test]
async fn test_get_endpoints_return_200() {
    let state = create_test_state();
    let endpoints = [
        "/api/v1/health",
        "/api/v1/dashboard",
        "/api/v1/parts",
        "/api/v1/parts/reorder",
        "/api/v1/maintenance",
        "/api/v1/preventive",
        "/api/v1/predictive/readings",
        "/api/v1/predictive/overview",
        "/api/v1/schedule",
        "/api/v1/vendors",
        "/api/v1/purchases",
        "/api/v1/purchases/summary",
        "/api/v1/alerts",
    ];

    for endpoint in &endpoints {
        let (status, _) = call(&state, Method::GET, endpoint, None).await;
        assert_eq!(status, StatusCode::OK, "GET {endpoint}");
    }
}

/// Success responses carry the data + meta envelope.
#[tokio::test]
async fn test_health_envelope() {
    let state = create_test_state();
    let (status, body) = call(&state, Method::GET, "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["backend"], "local");
    assert_eq!(body["data"]["auth_enabled"], false);
    assert!(body["meta"]["timestamp"].is_string());

    let (status, _) = call(&state, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

/// Empty dashboard shows "No data" rather than zeros.
#[tokio::test]
async fn test_dashboard_without_history() {
    let state = create_test_state();
    let (_, body) = call(&state, Method::GET, "/api/v1/dashboard", None).await;
    assert_eq!(body["data"]["has_data"], false);
    assert_eq!(body["data"]["mtbf"], "No data");
    assert_eq!(body["data"]["total_cost_display"], "$0");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let state = create_test_state();
    let (status, _) = call(&state, Method::GET, "/api/v1/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Errors use the error envelope with the mapped status code.
#[tokio::test]
async fn test_error_envelope_and_status_mapping() {
    let state = create_test_state();

    let (status, body) = call(&state, Method::GET, "/api/v1/machine", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, body) = call(&state, Method::POST, "/api/v1/vendors", Some(json!({ "name": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("name is required"));

    let (status, body) = call(&state, Method::PATCH, "/api/v1/maintenance/missing/status", Some(json!({ "status": "completed" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = call(&state, Method::DELETE, "/api/v1/vendors/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Malformed JSON bodies are rejected with the error envelope.
#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let state = create_test_state();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/parts")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = create_app(state).oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

/// Duplicate part numbers conflict.
#[tokio::test]
async fn test_duplicate_part_number_conflicts() {
    let state = create_test_state();
    let part = json!({ "part_number": "FLT-1", "name": "Chaff filter", "category": "Filters" });

    let (status, body) = call(&state, Method::POST, "/api/v1/parts", Some(part.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["part_number"], "FLT-1");
    assert_eq!(body["data"]["inventory"]["quantity_on_hand"], 0);

    let (status, body) = call(&state, Method::POST, "/api/v1/parts", Some(part)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

/// Auth routes report that authentication is not configured.
#[tokio::test]
async fn test_auth_routes_without_auth_service() {
    let state = create_test_state();
    let creds = json!({ "email": "ops@roastery.test", "password": "secret" });
    let (status, _) = call(&state, Method::POST, "/api/v1/auth/login", Some(creds)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

/// The calendar rejects unparseable dates and echoes the selected day.
#[tokio::test]
async fn test_schedule_date_parameter() {
    let state = create_test_state();
    let (status, body) = call(&state, Method::GET, "/api/v1/schedule?date=2025-06-12", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["date"], "2025-06-12");

    let (status, _) = call(&state, Method::GET, "/api/v1/schedule?date=12/06/2025", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
