//! Integration tests for the HTTP adapter.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain::Money;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

/// Builds the app with a seeded catalog and one registered user.
fn setup() -> axum::Router {
    let (state, catalog, users) = api::create_default_state();
    catalog.put_product(common::ProductId::new(1), "Widget", Money::from_cents(1000), 100);
    catalog.put_product(common::ProductId::new(2), "Gadget", Money::from_cents(500), 100);
    users.put_user(common::UserId::new(1), true);
    api::create_app(state, metrics_handle())
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn create_order_body() -> Value {
    json!({
        "user_id": 1,
        "items": [
            {"product_id": 1, "product_name": "Widget", "unit_price_cents": 1000, "quantity": 2},
            {"product_id": 2, "product_name": "Gadget", "unit_price_cents": 500, "quantity": 1}
        ],
        "address": "1 Main St",
        "phone": "555-0100"
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();
    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_create_and_get_order() {
    let app = setup();

    let (status, body) = send(&app, "POST", "/orders", Some(create_order_body())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["total_amount_cents"], 2500);
    let order_no = body["order_no"].as_str().unwrap().to_string();
    assert!(order_no.starts_with("ORD"));
    assert!(body["payment_url"].as_str().unwrap().contains(&order_no));

    let (status, body) = send(&app, "GET", &format!("/orders/{order_no}?user_id=1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "pending");
    assert_eq!(body["order"]["total_amount"], 2500);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_create_order_validation_maps_to_400() {
    let app = setup();
    let mut body = create_order_body();
    body["address"] = json!("");

    let (status, body) = send(&app, "POST", "/orders", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("address"));
}

#[tokio::test]
async fn test_get_unknown_order_is_404() {
    let app = setup();
    let (status, _) = send(&app, "GET", "/orders/ORD404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_foreign_user_gets_403() {
    let app = setup();
    let (_, body) = send(&app, "POST", "/orders", Some(create_order_body())).await;
    let order_no = body["order_no"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "GET", &format!("/orders/{order_no}?user_id=2"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_payment_flow_and_conflict_on_replay() {
    let app = setup();
    let (_, body) = send(&app, "POST", "/orders", Some(create_order_body())).await;
    let order_no = body["order_no"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/orders/{order_no}/pay"),
        Some(json!({"user_id": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "paid");
    assert!(body["paid_at"].is_string());

    let (status, _) = send(
        &app,
        "POST",
        &format!("/orders/{order_no}/pay"),
        Some(json!({"user_id": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_full_flow_ship_receipt_refund() {
    let app = setup();
    let (_, body) = send(&app, "POST", "/orders", Some(create_order_body())).await;
    let order_no = body["order_no"].as_str().unwrap().to_string();

    send(
        &app,
        "POST",
        &format!("/orders/{order_no}/pay"),
        Some(json!({"user_id": 1})),
    )
    .await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/orders/{order_no}/ship"),
        Some(json!({"shipping_no": "SF123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "shipped");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/orders/{order_no}/receipt"),
        Some(json!({"user_id": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");

    let (status, body) = send(
        &app,
        "POST",
        "/refunds",
        Some(json!({"order_no": order_no, "user_id": 1, "reason": "damaged"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["amount_cents"], 2500);
    let refund_no = body["refund_no"].as_str().unwrap().to_string();

    // A second application conflicts while the first is open.
    let (status, _) = send(
        &app,
        "POST",
        "/refunds",
        Some(json!({"order_no": order_no, "user_id": 1, "reason": "again"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/refunds/{refund_no}/process"),
        Some(json!({"processor_id": 99, "action": "approved", "remark": "ok"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");
}

#[tokio::test]
async fn test_cancel_returns_cancelled_status() {
    let app = setup();
    let (_, body) = send(&app, "POST", "/orders", Some(create_order_body())).await;
    let order_no = body["order_no"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/orders/{order_no}/cancel"),
        Some(json!({"user_id": 1, "reason": "changed my mind"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");
    assert!(body["cancelled_at"].is_string());
}

#[tokio::test]
async fn test_reserve_without_stock_is_409() {
    let app = setup();
    let (status, body) = send(
        &app,
        "POST",
        "/stock/reserve",
        Some(json!({"order_no": "ORD-X", "product_id": 1, "quantity": 1000})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("insufficient stock"));
}

#[tokio::test]
async fn test_reserve_release_confirm_cycle() {
    let app = setup();

    let (status, body) = send(
        &app,
        "POST",
        "/stock/reserve",
        Some(json!({"order_no": "ORD-X", "product_id": 1, "quantity": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "reserved");
    let reserve_id = body["reserve_id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        "/stock/confirm",
        Some(json!({"order_no": "ORD-X", "reserve_id": reserve_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "confirmed");

    // Terminal now; releasing it conflicts.
    let (status, _) = send(
        &app,
        "POST",
        "/stock/release",
        Some(json!({"reserve_id": reserve_id, "reason": "late release"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_timeout_task_is_404() {
    let app = setup();
    let (status, _) = send(
        &app,
        "POST",
        "/timeouts/process",
        Some(json!({"task_id": "TASK404", "kind": "order_unpaid"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stats_endpoint_aggregates() {
    let app = setup();
    send(&app, "POST", "/orders", Some(create_order_body())).await;
    send(&app, "POST", "/orders", Some(create_order_body())).await;

    let (status, body) = send(&app, "GET", "/orders/stats?user_id=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_orders"], 2);
    assert_eq!(body["total_amount"], 5000);
    assert_eq!(body["status_counts"]["pending"], 2);
}

#[tokio::test]
async fn test_list_orders_paginates() {
    let app = setup();
    for _ in 0..3 {
        send(&app, "POST", "/orders", Some(create_order_body())).await;
    }

    let (status, body) = send(&app, "GET", "/orders?user_id=1&page=1&page_size=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["orders"].as_array().unwrap().len(), 2);

    let (_, body) = send(&app, "GET", "/orders?user_id=1&status=paid", None).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_metrics_endpoint_renders() {
    let app = setup();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
