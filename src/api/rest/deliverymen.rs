use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::get;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::api::extract::{Path, Query, ValidatedJson};
use crate::error::AppError;
use crate::models::deliveryman::Deliveryman;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/deliverymen", get(list_deliverymen).post(create_deliveryman))
        .route(
            "/deliverymen/:id",
            get(get_deliveryman)
                .put(update_deliveryman)
                .delete(delete_deliveryman),
        )
}

#[derive(Debug, Deserialize)]
pub struct ListDeliverymenQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDeliverymanRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub avatar_id: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDeliverymanRequest {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub avatar_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub ok: bool,
}

async fn list_deliverymen(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListDeliverymenQuery>,
) -> Json<Vec<Deliveryman>> {
    let needle = query.q.to_lowercase();
    Json(
        state
            .store
            .deliverymen
            .filter(|deliveryman| deliveryman.name.to_lowercase().contains(&needle)),
    )
}

async fn get_deliveryman(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Deliveryman>, AppError> {
    state
        .store
        .deliverymen
        .get(id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Deliveryman not found".to_string()))
}

async fn create_deliveryman(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<CreateDeliverymanRequest>,
) -> Result<Json<Deliveryman>, AppError> {
    ensure_avatar_exists(&state, payload.avatar_id)?;

    let now = Utc::now();
    let deliveryman = state
        .store
        .register_deliveryman(&payload.email, |id| Deliveryman {
            id,
            name: payload.name,
            email: payload.email.clone(),
            avatar_id: payload.avatar_id,
            created_at: now,
            updated_at: now,
        })
        .ok_or_else(|| AppError::BadRequest("Deliveryman already exists".to_string()))?;

    info!(deliveryman_id = deliveryman.id, "deliveryman created");

    Ok(Json(deliveryman))
}

async fn update_deliveryman(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<UpdateDeliverymanRequest>,
) -> Result<Json<Deliveryman>, AppError> {
    if !state.store.deliverymen.contains(id) {
        return Err(AppError::NotFound("Deliveryman not found".to_string()));
    }

    ensure_avatar_exists(&state, payload.avatar_id)?;
    if let Some(email) = &payload.email {
        if !state.store.claim_deliveryman_email(id, email) {
            return Err(AppError::BadRequest("Deliveryman already exists".to_string()));
        }
    }

    let deliveryman = state
        .store
        .deliverymen
        .update(id, |deliveryman| {
            if let Some(name) = payload.name {
                deliveryman.name = name;
            }
            if let Some(email) = payload.email {
                deliveryman.email = email;
            }
            if let Some(avatar_id) = payload.avatar_id {
                deliveryman.avatar_id = Some(avatar_id);
            }
            deliveryman.updated_at = Utc::now();
        })
        .ok_or_else(|| AppError::NotFound("Deliveryman not found".to_string()))?;

    info!(deliveryman_id = deliveryman.id, "deliveryman updated");

    Ok(Json(deliveryman))
}

async fn delete_deliveryman(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Deleted>, AppError> {
    if !state.store.deliverymen.contains(id) {
        return Err(AppError::NotFound("Deliveryman not found".to_string()));
    }
    if state.store.has_active_orders(id) {
        return Err(AppError::BadRequest(
            "Deliveryman still has active deliveries".to_string(),
        ));
    }

    state.store.remove_deliveryman(id);
    info!(deliveryman_id = id, "deliveryman deleted");

    Ok(Json(Deleted { ok: true }))
}

fn ensure_avatar_exists(state: &AppState, avatar_id: Option<i64>) -> Result<(), AppError> {
    match avatar_id {
        Some(avatar_id) if !state.store.files.contains(avatar_id) => {
            Err(AppError::NotFound("Avatar file not found".to_string()))
        }
        _ => Ok(()),
    }
}
