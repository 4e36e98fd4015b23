//! API route definitions
//!
//! Organizes endpoints under `/api/v1`:
//! - /health, /auth/* - public
//! - /dashboard, /machine - KPIs and the roaster profile
//! - /parts, /maintenance, /preventive, /schedule - maintenance work
//! - /predictive/* - sensor readings and alarms
//! - /vendors, /purchases - procurement
//! - /alerts - notifications
//!
//! Everything except the public routes passes through
//! [`require_session`](super::middleware::require_session).

use axum::middleware::from_fn_with_state;
use axum::routing::{get, patch, post, put};
use axum::Router;

use super::handlers::{
    self, alerts, auth, health, machine, maintenance, parts, predictive, preventive, procurement,
};
use super::middleware::require_session;

/// Create all API routes
pub fn api_routes(state: handlers::AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health::health))
        .route("/auth/login", post(auth::login))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/logout", post(auth::logout));

    let data = Router::new()
        .route("/dashboard", get(machine::get_dashboard))
        .route("/machine", get(machine::get_machine).put(machine::save_machine))
        // Parts and inventory
        .route("/parts", get(parts::list_parts).post(parts::create_part))
        .route("/parts/reorder", get(parts::reorder_list))
        .route("/parts/:id/stock", put(parts::set_stock))
        // Work orders
        .route(
            "/maintenance",
            get(maintenance::list_work_orders).post(maintenance::create_work_order),
        )
        .route("/maintenance/:id", get(maintenance::get_work_order))
        .route("/maintenance/:id/status", patch(maintenance::update_work_order_status))
        // Preventive schedules and calendar
        .route(
            "/preventive",
            get(preventive::list_schedules).post(preventive::create_schedule),
        )
        .route(
            "/preventive/:id",
            patch(preventive::update_schedule).delete(preventive::delete_schedule),
        )
        .route("/preventive/:id/performed", post(preventive::record_performed))
        .route("/schedule", get(preventive::get_calendar))
        // Sensor readings
        .route(
            "/predictive/readings",
            get(predictive::list_readings).post(predictive::record_reading),
        )
        .route("/predictive/overview", get(predictive::overview))
        // Procurement
        .route(
            "/vendors",
            get(procurement::list_vendors).post(procurement::create_vendor),
        )
        .route("/vendors/:id", axum::routing::delete(procurement::delete_vendor))
        .route(
            "/purchases",
            get(procurement::list_orders).post(procurement::create_order),
        )
        .route("/purchases/summary", get(procurement::pending_summary))
        .route("/purchases/:id/status", patch(procurement::update_order_status))
        // Alerts
        .route("/alerts", get(alerts::list_alerts))
        .route("/alerts/:id/read", post(alerts::mark_read))
        .route("/alerts/:id/resolve", post(alerts::resolve))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    public.merge(data).with_state(state)
}

/// Unversioned health check at `/health` for load balancers
pub fn legacy_routes(state: handlers::AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthClient;
    use crate::store::LocalStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn create_test_state() -> handlers::AppState {
        handlers::AppState::new(Arc::new(LocalStore::temporary().unwrap()), None)
    }

    async fn get_status(app: Router, uri: &str) -> StatusCode {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_api_routes_health() {
        let app = api_routes(create_test_state());
        assert_eq!(get_status(app, "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_legacy_health() {
        let app = legacy_routes(create_test_state());
        assert_eq!(get_status(app, "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_list_routes_on_empty_store() {
        let state = create_test_state();
        for uri in [
            "/parts",
            "/parts/reorder",
            "/maintenance",
            "/preventive",
            "/predictive/readings",
            "/predictive/overview",
            "/schedule?date=2025-06-12",
            "/vendors",
            "/purchases",
            "/purchases/summary",
            "/alerts",
            "/dashboard",
        ] {
            let status = get_status(api_routes(state.clone()), uri).await;
            assert_eq!(status, StatusCode::OK, "GET {uri}");
        }
    }

    #[tokio::test]
    async fn test_machine_missing_is_not_found() {
        let app = api_routes(create_test_state());
        assert_eq!(get_status(app, "/machine").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bad_query_values_are_rejected() {
        let state = create_test_state();
        assert_eq!(
            get_status(api_routes(state.clone()), "/maintenance?status=on_hold").await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(api_routes(state), "/schedule?date=June").await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_data_routes_require_session_when_auth_enabled() {
        let auth = AuthClient::new("http://127.0.0.1:9", "anon", Duration::from_secs(1)).unwrap();
        let state = handlers::AppState::new(
            Arc::new(LocalStore::temporary().unwrap()),
            Some(Arc::new(auth)),
        );
        assert_eq!(get_status(api_routes(state.clone()), "/parts").await, StatusCode::UNAUTHORIZED);
        assert_eq!(get_status(api_routes(state), "/health").await, StatusCode::OK);
    }
}
