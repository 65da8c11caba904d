use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::{delete, get};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use crate::api::extract::{Path, ValidatedJson};
use crate::error::AppError;
use crate::jobs::Job;
use crate::jobs::mail::CancelationMailPayload;
use crate::models::delivery_problem::DeliveryProblem;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/deliveries/:delivery_id/problems",
            get(list_delivery_problems).post(create_problem),
        )
        .route("/problems", get(list_problems))
        .route("/problems/:problem_id", delete(resolve_problem))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProblemRequest {
    #[validate(length(min = 1))]
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct Acknowledgement {
    pub ok: bool,
}

async fn list_problems(State(state): State<Arc<AppState>>) -> Json<Vec<DeliveryProblem>> {
    Json(state.store.problems.all())
}

async fn list_delivery_problems(
    State(state): State<Arc<AppState>>,
    Path(delivery_id): Path<i64>,
) -> Json<Vec<DeliveryProblem>> {
    Json(state.store.problems_for(delivery_id))
}

async fn create_problem(
    State(state): State<Arc<AppState>>,
    Path(delivery_id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<CreateProblemRequest>,
) -> Result<Json<DeliveryProblem>, AppError> {
    let order_is_open = state
        .store
        .orders
        .get(delivery_id)
        .is_some_and(|order| !order.is_canceled());
    if !order_is_open {
        return Err(AppError::BadRequest(
            "Order doesnt exists or its canceled".to_string(),
        ));
    }

    let now = Utc::now();
    let problem = state.store.problems.insert_with(|id| DeliveryProblem {
        id,
        delivery_id,
        description: payload.description,
        created_at: now,
        updated_at: now,
    });

    info!(problem_id = problem.id, delivery_id, "delivery problem recorded");

    Ok(Json(problem))
}

/// Resolving a problem cancels its whole order, even when other problems
/// against the same order are still open. The problem row is kept.
async fn resolve_problem(
    State(state): State<Arc<AppState>>,
    Path(problem_id): Path<i64>,
) -> Result<Json<Acknowledgement>, AppError> {
    let problem = state
        .store
        .problems
        .get(problem_id)
        .ok_or_else(|| AppError::NotFound("Delivery problem not found".to_string()))?;

    let order = state
        .store
        .cancel_order(problem.delivery_id, Utc::now())
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
    state.metrics.orders_canceled_total.inc();

    let details = state.store.order_details(&order);
    match (details.deliveryman, details.recipient) {
        (Some(deliveryman), Some(recipient)) => {
            let receipt = state
                .queue
                .enqueue(Job::OrderCanceled(CancelationMailPayload {
                    deliveryman,
                    recipient,
                    product: order.product.clone(),
                    problem: problem.description,
                }))
                .await?;
            info!(order_id = order.id, problem_id, job_id = %receipt.id, "order canceled");
        }
        _ => {
            warn!(
                order_id = order.id,
                problem_id, "order canceled without deliveryman or recipient; no mail queued"
            );
        }
    }

    Ok(Json(Acknowledgement { ok: true }))
}
