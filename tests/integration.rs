use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use delivery_api::api::rest::router;
use delivery_api::config::Config;
use delivery_api::jobs::Job;
use delivery_api::jobs::queue::QueuedJob;
use delivery_api::state::AppState;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tower::ServiceExt;

struct TestApp {
    app: axum::Router,
    state: Arc<AppState>,
    jobs: mpsc::Receiver<QueuedJob>,
    _uploads: tempfile::TempDir,
}

fn setup() -> TestApp {
    let uploads = tempfile::tempdir().unwrap();
    let config = Config {
        uploads_dir: uploads.path().to_path_buf(),
        ..Config::default()
    };
    let (state, jobs) = AppState::with_channel_queue(config);
    let state = Arc::new(state);

    TestApp {
        app: router(state.clone()),
        state,
        jobs,
        _uploads: uploads,
    }
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

async fn create_deliveryman(app: &axum::Router, name: &str, email: &str) -> Value {
    let (status, body) = send(
        app,
        json_request("POST", "/deliverymen", json!({ "name": name, "email": email })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body
}

async fn create_recipient(app: &axum::Router, name: &str) -> Value {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/recipients",
            json!({
                "name": name,
                "street": "Rua Augusta",
                "number": "1500",
                "complement": "apto 12",
                "state": "sp",
                "city": "Sao Paulo",
                "cep": "01304-001"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body
}

async fn create_order(
    app: &axum::Router,
    deliveryman_id: i64,
    recipient_id: i64,
    product: &str,
) -> Value {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/orders",
            json!({
                "deliveryman_id": deliveryman_id,
                "recipient_id": recipient_id,
                "product": product
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body
}

async fn create_problem(
    app: &axum::Router,
    delivery_id: i64,
    description: &str,
) -> (StatusCode, Value) {
    send(
        app,
        json_request(
            "POST",
            &format!("/deliveries/{delivery_id}/problems"),
            json!({ "description": description }),
        ),
    )
    .await
}

#[tokio::test]
async fn health_returns_ok() {
    let t = setup();
    let (status, body) = send(&t.app, empty_request("GET", "/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["orders"], 0);
    assert_eq!(body["recipients"], 0);
    assert_eq!(body["deliverymen"], 0);
    assert_eq!(body["problems"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let t = setup();
    let response = t.app.oneshot(empty_request("GET", "/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("jobs_in_queue"));
    assert!(body.contains("orders_canceled_total"));
}

#[tokio::test]
async fn create_order_returns_fresh_order_and_enqueues_mail() {
    let mut t = setup();
    create_deliveryman(&t.app, "Ana", "ana@fastfeet.com").await;
    create_recipient(&t.app, "Bruno").await;
    create_recipient(&t.app, "Carla").await;

    let order = create_order(&t.app, 1, 2, "Book").await;
    assert_eq!(order["id"], 1);
    assert_eq!(order["product"], "Book");
    assert_eq!(order["deliveryman_id"], 1);
    assert_eq!(order["recipient_id"], 2);
    assert!(order["canceled_at"].is_null());
    assert!(order["end_date"].is_null());
    assert!(order["start_date"].is_null());

    let queued = t.jobs.try_recv().unwrap();
    assert_eq!(queued.receipt.key, "OrderMail");
    match queued.job {
        Job::OrderCreated(payload) => {
            assert_eq!(payload.product, "Book");
            assert_eq!(payload.deliveryman.email, "ana@fastfeet.com");
            assert_eq!(payload.recipient.name, "Carla");
        }
        other => panic!("unexpected job {other:?}"),
    }
    assert!(t.jobs.try_recv().is_err());
}

#[tokio::test]
async fn create_order_with_unknown_deliveryman_is_rejected() {
    let mut t = setup();
    create_recipient(&t.app, "Bruno").await;

    let (status, body) = send(
        &t.app,
        json_request(
            "POST",
            "/orders",
            json!({ "deliveryman_id": 999, "recipient_id": 1, "product": "Book" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "There isnt a deliveryman with this id" }));
    assert!(t.jobs.try_recv().is_err());
    assert_eq!(t.state.store.orders.len(), 0);
}

#[tokio::test]
async fn create_order_with_unknown_recipient_is_rejected() {
    let t = setup();
    create_deliveryman(&t.app, "Ana", "ana@fastfeet.com").await;

    let (status, body) = send(
        &t.app,
        json_request(
            "POST",
            "/orders",
            json!({ "deliveryman_id": 1, "recipient_id": 7, "product": "Book" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "There isnt a recipient with this id");
}

#[tokio::test]
async fn create_order_validation_failures_return_400() {
    let t = setup();

    for payload in [
        json!({ "recipient_id": 1, "product": "Book" }),
        json!({ "deliveryman_id": 1, "recipient_id": 1 }),
        json!({ "deliveryman_id": 1, "recipient_id": 1, "product": "" }),
        json!({ "deliveryman_id": "one", "recipient_id": 1, "product": "Book" }),
    ] {
        let (status, body) = send(&t.app, json_request("POST", "/orders", payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Validation fails");
    }
}

#[tokio::test]
async fn list_orders_filters_by_product_and_skips_inactive() {
    let t = setup();
    create_deliveryman(&t.app, "Ana", "ana@fastfeet.com").await;
    create_recipient(&t.app, "Bruno").await;
    create_order(&t.app, 1, 1, "Blue Notebook").await;
    create_order(&t.app, 1, 1, "notebook charger").await;
    create_order(&t.app, 1, 1, "Desk Lamp").await;
    t.state
        .store
        .orders
        .update(2, |order| order.end_date = Some(chrono::Utc::now()));

    let (status, body) = send(&t.app, empty_request("GET", "/orders?q=NOTEBOOK")).await;
    assert_eq!(status, StatusCode::OK);

    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order["product"], "Blue Notebook");
    assert_eq!(order["recipient"]["name"], "Bruno");
    assert_eq!(order["recipient"]["state"], "SP");
    assert_eq!(order["recipient"]["cep"], "01304001");
    assert_eq!(order["deliveryman"]["name"], "Ana");
    assert_eq!(order["deliveryman"]["email"], "ana@fastfeet.com");
    assert!(order["deliveryman"]["avatar"].is_null());

    let (_, body) = send(&t.app, empty_request("GET", "/orders")).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn problem_against_canceled_or_missing_order_fails() {
    let t = setup();
    create_deliveryman(&t.app, "Ana", "ana@fastfeet.com").await;
    create_recipient(&t.app, "Bruno").await;
    create_order(&t.app, 1, 1, "Book").await;

    let (status, body) = create_problem(&t.app, 42, "Lost").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Order doesnt exists or its canceled");

    t.state.store.cancel_order(1, chrono::Utc::now());
    let (status, body) = create_problem(&t.app, 1, "Lost").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Order doesnt exists or its canceled");
}

#[tokio::test]
async fn problem_requires_description() {
    let t = setup();
    create_deliveryman(&t.app, "Ana", "ana@fastfeet.com").await;
    create_recipient(&t.app, "Bruno").await;
    create_order(&t.app, 1, 1, "Book").await;

    let (status, body) = create_problem(&t.app, 1, "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation fails");
}

#[tokio::test]
async fn problems_are_listed_per_delivery() {
    let t = setup();
    create_deliveryman(&t.app, "Ana", "ana@fastfeet.com").await;
    create_recipient(&t.app, "Bruno").await;
    create_order(&t.app, 1, 1, "Book").await;
    create_order(&t.app, 1, 1, "Pen").await;

    let (status, problem) = create_problem(&t.app, 1, "Recipient absent").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(problem["delivery_id"], 1);
    assert_eq!(problem["description"], "Recipient absent");
    create_problem(&t.app, 1, "Wrong address").await;
    create_problem(&t.app, 2, "Box damaged").await;

    let (status, body) = send(&t.app, empty_request("GET", "/deliveries/1/problems")).await;
    assert_eq!(status, StatusCode::OK);
    let descriptions: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|problem| problem["description"].as_str().unwrap())
        .collect();
    assert_eq!(descriptions, vec!["Recipient absent", "Wrong address"]);

    let (status, body) = send(&t.app, empty_request("GET", "/deliveries/99/problems")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (_, body) = send(&t.app, empty_request("GET", "/problems")).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn resolving_any_problem_cancels_the_order() {
    let mut t = setup();
    create_deliveryman(&t.app, "Ana", "ana@fastfeet.com").await;
    create_recipient(&t.app, "Bruno").await;
    create_order(&t.app, 1, 1, "Book").await;
    create_problem(&t.app, 1, "Recipient absent").await;
    create_problem(&t.app, 1, "Box damaged").await;
    let _order_mail = t.jobs.try_recv().unwrap();

    let (status, body) = send(&t.app, empty_request("DELETE", "/problems/2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));

    let order = t.state.store.orders.get(1).unwrap();
    assert!(order.canceled_at.is_some());
    assert_eq!(t.state.metrics.orders_canceled_total.get(), 1);

    let queued = t.jobs.try_recv().unwrap();
    assert_eq!(queued.receipt.key, "CancelationMail");
    match queued.job {
        Job::OrderCanceled(payload) => {
            assert_eq!(payload.product, "Book");
            assert_eq!(payload.problem, "Box damaged");
            assert_eq!(payload.deliveryman.name, "Ana");
            assert_eq!(payload.recipient.name, "Bruno");
        }
        other => panic!("unexpected job {other:?}"),
    }

    let (_, body) = send(&t.app, empty_request("GET", "/orders")).await;
    assert_eq!(body, json!([]));

    let (_, body) = send(&t.app, empty_request("GET", "/deliveries/1/problems")).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn resolving_unknown_problem_returns_400() {
    let t = setup();
    let (status, body) = send(&t.app, empty_request("DELETE", "/problems/5")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Delivery problem not found");
}

#[tokio::test]
async fn get_order_includes_nested_projections() {
    let t = setup();
    create_deliveryman(&t.app, "Ana", "ana@fastfeet.com").await;
    create_recipient(&t.app, "Bruno").await;
    create_order(&t.app, 1, 1, "Book").await;

    let (status, body) = send(&t.app, empty_request("GET", "/orders/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"], "Book");
    assert_eq!(body["recipient"]["complement"], "apto 12");

    let (status, body) = send(&t.app, empty_request("GET", "/orders/9")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Order not found");
}

#[tokio::test]
async fn closed_queue_answers_500_but_keeps_the_writes() {
    let t = setup();
    create_deliveryman(&t.app, "Ana", "ana@fastfeet.com").await;
    create_recipient(&t.app, "Bruno").await;
    create_order(&t.app, 1, 1, "Book").await;
    create_problem(&t.app, 1, "Recipient absent").await;
    drop(t.jobs);

    let (status, body) = send(
        &t.app,
        json_request(
            "POST",
            "/orders",
            json!({ "deliveryman_id": 1, "recipient_id": 1, "product": "Pen" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "job queue is closed");
    assert_eq!(t.state.store.orders.get(2).unwrap().product, "Pen");

    let (status, _) = send(&t.app, empty_request("DELETE", "/problems/1")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(t.state.store.orders.get(1).unwrap().canceled_at.is_some());
}

#[tokio::test]
async fn resolving_problem_without_deliveryman_cancels_without_mail() {
    let mut t = setup();
    create_deliveryman(&t.app, "Ana", "ana@fastfeet.com").await;
    create_recipient(&t.app, "Bruno").await;
    create_order(&t.app, 1, 1, "Book").await;
    create_problem(&t.app, 1, "Recipient absent").await;
    let _order_mail = t.jobs.try_recv().unwrap();
    t.state.store.remove_deliveryman(1);

    let (status, body) = send(&t.app, empty_request("DELETE", "/problems/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
    assert!(t.state.store.orders.get(1).unwrap().canceled_at.is_some());
    assert!(t.jobs.try_recv().is_err());
}

#[tokio::test]
async fn malformed_order_id_answers_json_error() {
    let t = setup();
    let (status, body) = send(&t.app, empty_request("GET", "/orders/abc")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
