//! End-to-end maintenance workflow through the HTTP API
//!
//! Registers the roaster, stocks a part, books it against a work order,
//! restocks it through a delivered purchase order, records readings and
//! preventive work, and checks the derived views (dashboard, alerts,
//! reorder list) along the way. Runs over an on-disk local store in a
//! temporary directory.

use roaster_cmms::api::{create_app, AppState};
use roaster_cmms::store::LocalStore;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

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

async fn expect(state: &AppState, method: Method, uri: &str, body: Option<Value>, want: StatusCode) -> Value {
    let (status, json) = call(state, method.clone(), uri, body).await;
    assert_eq!(status, want, "{method} {uri} -> {json}");
    json["data"].clone()
}

fn find_part<'a>(parts: &'a Value, id: &str) -> &'a Value {
    parts
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == id)
        .unwrap()
}

#[tokio::test]
async fn test_full_maintenance_workflow() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("cmms");
    let state = AppState::new(Arc::new(LocalStore::open(&db_path).unwrap()), None);

    // Machine registration, then a partial profile update.
    let machine = expect(
        &state,
        Method::PUT,
        "/api/v1/machine",
        Some(json!({
            "name": "Roaster 1",
            "model": "P25",
            "serial_number": "SN-2231",
            "manufacturer": "Probat",
            "installation_date": "2021-04-12"
        })),
        StatusCode::OK,
    )
    .await;
    assert_eq!(machine["status"], "operational");
    let updated = expect(&state, Method::PUT, "/api/v1/machine", Some(json!({ "location": "Bay 2" })), StatusCode::OK).await;
    assert_eq!(updated["id"], machine["id"]);
    assert_eq!(updated["location"], "Bay 2");
    assert_eq!(updated["model"], "P25");

    // Part with a counted stock of 3 and a reorder point of 2.
    let part = expect(
        &state,
        Method::POST,
        "/api/v1/parts",
        Some(json!({
            "part_number": "BRG-1",
            "name": "Drum bearing",
            "category": "Drive",
            "unit_cost": 45.0,
            "reorder_point": 2,
            "reorder_quantity": 4
        })),
        StatusCode::CREATED,
    )
    .await;
    let part_id = part["id"].as_str().unwrap().to_string();
    let counted = expect(
        &state,
        Method::PUT,
        &format!("/api/v1/parts/{part_id}/stock"),
        Some(json!({ "quantity": 3 })),
        StatusCode::OK,
    )
    .await;
    assert_eq!(counted["inventory"]["quantity_on_hand"], 3);
    let (status, _) = call(&state, Method::PUT, &format!("/api/v1/parts/{part_id}/stock"), Some(json!({ "quantity": -1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A completed corrective work order consuming two bearings.
    let work_order = expect(
        &state,
        Method::POST,
        "/api/v1/maintenance",
        Some(json!({
            "work_order_number": "WO-100",
            "maintenance_type": "corrective",
            "priority": "high",
            "failure_description": "Grinding noise from drum",
            "downtime_hours": 3.0,
            "started_at": "2025-06-01T08:00",
            "completed_at": "2025-06-01T11:00",
            "parts": [{ "part_id": part_id, "quantity": 2 }]
        })),
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(work_order["status"], "completed");
    assert_eq!(work_order["parts_used"].as_array().unwrap().len(), 1);
    assert_eq!(work_order["parts_used"][0]["total_cost"], 90.0);
    let wo_id = work_order["id"].as_str().unwrap().to_string();

    let fetched = expect(&state, Method::GET, &format!("/api/v1/maintenance/{wo_id}"), None, StatusCode::OK).await;
    assert_eq!(fetched["work_order_number"], "WO-100");
    let completed = expect(&state, Method::GET, "/api/v1/maintenance?status=completed", None, StatusCode::OK).await;
    assert_eq!(completed.as_array().unwrap().len(), 1);
    let open = expect(&state, Method::GET, "/api/v1/maintenance?status=open", None, StatusCode::OK).await;
    assert!(open.as_array().unwrap().is_empty());

    // Missing description and unknown parts are rejected.
    let (status, _) = call(&state, Method::POST, "/api/v1/maintenance", Some(json!({ "failure_description": " " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = call(
        &state,
        Method::POST,
        "/api/v1/maintenance",
        Some(json!({ "failure_description": "x", "parts": [{ "part_id": "ghost", "quantity": 1 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Stock drew down to 1, crossing the reorder point.
    let parts = expect(&state, Method::GET, "/api/v1/parts", None, StatusCode::OK).await;
    assert_eq!(find_part(&parts, &part_id)["inventory"]["quantity_on_hand"], 1);
    let reorder = expect(&state, Method::GET, "/api/v1/parts/reorder", None, StatusCode::OK).await;
    assert_eq!(reorder[0]["part_id"], part_id.as_str());
    assert_eq!(reorder[0]["suggested_quantity"], 4);

    let board = expect(&state, Method::GET, "/api/v1/alerts", None, StatusCode::OK).await;
    assert_eq!(board["active"].as_array().unwrap().len(), 1);
    assert_eq!(board["active"][0]["alert_type"], "low_stock");
    assert_eq!(board["unread"], 1);

    // Dashboard KPIs from the single completed record.
    let kpis = expect(&state, Method::GET, "/api/v1/dashboard", None, StatusCode::OK).await;
    assert_eq!(kpis["has_data"], true);
    assert_eq!(kpis["completed_records"], 1);
    assert_eq!(kpis["failures"], 1);
    assert_eq!(kpis["mtbf"], "N/A");
    assert_eq!(kpis["mttr"], "3.0 hrs");
    assert_eq!(kpis["active_alerts"], 1);

    // Restock through a delivered purchase order.
    let vendor = expect(
        &state,
        Method::POST,
        "/api/v1/vendors",
        Some(json!({ "name": "Roaster Spares Ltd", "email": "orders@spares.example" })),
        StatusCode::CREATED,
    )
    .await;
    let order = expect(
        &state,
        Method::POST,
        "/api/v1/purchases",
        Some(json!({
            "po_number": "PO-1",
            "part_id": part_id,
            "vendor_id": vendor["id"],
            "order_date": "2025-06-02",
            "expected_delivery_date": "2025-06-09",
            "quantity": 4,
            "unit_price": 45.0
        })),
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(order["total_price"], 180.0);
    let summary = expect(&state, Method::GET, "/api/v1/purchases/summary", None, StatusCode::OK).await;
    assert_eq!(summary["pending_orders"], 1);

    let order_id = order["id"].as_str().unwrap().to_string();
    let delivered = expect(
        &state,
        Method::PATCH,
        &format!("/api/v1/purchases/{order_id}/status"),
        Some(json!({ "status": "delivered" })),
        StatusCode::OK,
    )
    .await;
    assert!(delivered["actual_delivery_date"].is_string());
    let parts = expect(&state, Method::GET, "/api/v1/parts", None, StatusCode::OK).await;
    assert_eq!(find_part(&parts, &part_id)["inventory"]["quantity_on_hand"], 5);
    let summary = expect(&state, Method::GET, "/api/v1/purchases/summary", None, StatusCode::OK).await;
    assert_eq!(summary["pending_orders"], 0);

    // An out-of-range reading raises a critical alert.
    let reading = expect(
        &state,
        Method::POST,
        "/api/v1/predictive/readings",
        Some(json!({
            "sensor_name": "Exhaust temperature",
            "sensor_type": "temperature",
            "reading_value": 262.0,
            "unit": "C",
            "threshold_min": 180.0,
            "threshold_max": 250.0
        })),
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(reading["is_alarm"], true);
    let overview = expect(&state, Method::GET, "/api/v1/predictive/overview", None, StatusCode::OK).await;
    assert_eq!(overview["active_alarms"].as_array().unwrap().len(), 1);
    assert_eq!(overview["recent"][0]["status"], "alarm");

    // Preventive schedule performed early rolls forward from the performed date.
    let schedule = expect(
        &state,
        Method::POST,
        "/api/v1/preventive",
        Some(json!({
            "schedule_name": "Clean chaff collector",
            "frequency_type": "weekly",
            "frequency_value": 1,
            "next_due_date": "2025-06-10",
            "checklist_items": "Empty collector\nInspect seals"
        })),
        StatusCode::CREATED,
    )
    .await;
    let schedule_id = schedule["id"].as_str().unwrap().to_string();
    let performed = expect(
        &state,
        Method::POST,
        &format!("/api/v1/preventive/{schedule_id}/performed"),
        Some(json!({ "performed_on": "2025-06-09" })),
        StatusCode::OK,
    )
    .await;
    assert_eq!(performed["last_performed_date"], "2025-06-09");
    assert_eq!(performed["next_due_date"], "2025-06-16");

    let calendar = expect(&state, Method::GET, "/api/v1/schedule?date=2025-06-16", None, StatusCode::OK).await;
    assert_eq!(calendar["events"][0]["type"], "preventive");
    assert_eq!(calendar["events"][0]["title"], "Clean chaff collector");

    let paused = expect(
        &state,
        Method::PATCH,
        &format!("/api/v1/preventive/{schedule_id}"),
        Some(json!({ "is_active": false })),
        StatusCode::OK,
    )
    .await;
    assert_eq!(paused["is_active"], false);
    let calendar = expect(&state, Method::GET, "/api/v1/schedule?date=2025-06-16", None, StatusCode::OK).await;
    assert!(calendar["events"].as_array().unwrap().is_empty());

    // Work through the alerts.
    let board = expect(&state, Method::GET, "/api/v1/alerts", None, StatusCode::OK).await;
    assert_eq!(board["active"].as_array().unwrap().len(), 2);
    let first = board["active"][0]["id"].as_str().unwrap().to_string();
    let read = expect(&state, Method::POST, &format!("/api/v1/alerts/{first}/read"), None, StatusCode::OK).await;
    assert_eq!(read["is_read"], true);
    let resolved = expect(&state, Method::POST, &format!("/api/v1/alerts/{first}/resolve"), None, StatusCode::OK).await;
    assert_eq!(resolved["is_resolved"], true);
    let board = expect(&state, Method::GET, "/api/v1/alerts", None, StatusCode::OK).await;
    assert_eq!(board["active"].as_array().unwrap().len(), 1);
    assert_eq!(board["resolved"].as_array().unwrap().len(), 1);
    assert_eq!(board["unread"], 1);

    // Deleting twice reports the schedule as gone.
    expect(&state, Method::DELETE, &format!("/api/v1/preventive/{schedule_id}"), None, StatusCode::OK).await;
    let (status, _) = call(&state, Method::DELETE, &format!("/api/v1/preventive/{schedule_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
