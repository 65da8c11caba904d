use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::get;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::api::extract::{Path, Query, ValidatedJson};
use crate::error::AppError;
use crate::jobs::Job;
use crate::jobs::mail::OrderMailPayload;
use crate::models::order::{Order, OrderDetails};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/:id", get(get_order))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub deliveryman_id: i64,
    pub recipient_id: i64,
    #[validate(length(min = 1))]
    pub product: String,
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListOrdersQuery>,
) -> Json<Vec<OrderDetails>> {
    let orders = state
        .store
        .active_orders(&query.q)
        .iter()
        .map(|order| state.store.order_details(order))
        .collect();

    Json(orders)
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<OrderDetails>, AppError> {
    let order = state
        .store
        .orders
        .get(id)
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    Ok(Json(state.store.order_details(&order)))
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<CreateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    let deliveryman = state
        .store
        .deliverymen
        .get(payload.deliveryman_id)
        .ok_or_else(|| AppError::NotFound("There isnt a deliveryman with this id".to_string()))?;

    let recipient = state
        .store
        .recipients
        .get(payload.recipient_id)
        .ok_or_else(|| AppError::NotFound("There isnt a recipient with this id".to_string()))?;

    let now = Utc::now();
    let order = state.store.orders.insert_with(|id| Order {
        id,
        product: payload.product.clone(),
        deliveryman_id: deliveryman.id,
        recipient_id: recipient.id,
        signature_id: None,
        start_date: None,
        end_date: None,
        canceled_at: None,
        created_at: now,
        updated_at: now,
    });

    let receipt = state
        .queue
        .enqueue(Job::OrderCreated(OrderMailPayload {
            deliveryman,
            recipient,
            product: payload.product,
        }))
        .await?;

    info!(order_id = order.id, job_id = %receipt.id, "order created");

    Ok(Json(order))
}
