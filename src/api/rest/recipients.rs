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
use crate::models::recipient::{Recipient, RecipientChanges, normalize_cep, validate_cep};
use crate::state::AppState;

pub const PAGE_SIZE: usize = 20;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recipients", get(list_recipients).post(create_recipient))
        .route("/recipients/:id", get(get_recipient).put(update_recipient))
}

#[derive(Debug, Deserialize)]
pub struct ListRecipientsQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default = "first_page")]
    pub page: usize,
}

fn first_page() -> usize {
    1
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRecipientRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub street: String,
    #[validate(length(min = 1))]
    pub number: String,
    pub complement: Option<String>,
    #[validate(length(equal = 2))]
    pub state: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(custom = "validate_cep")]
    pub cep: String,
}

async fn list_recipients(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListRecipientsQuery>,
) -> Json<Vec<Recipient>> {
    let needle = query.q.to_lowercase();
    let offset = query.page.max(1).saturating_sub(1).saturating_mul(PAGE_SIZE);

    let recipients = state
        .store
        .recipients
        .filter(|recipient| recipient.name.to_lowercase().contains(&needle))
        .into_iter()
        .skip(offset)
        .take(PAGE_SIZE)
        .collect();

    Json(recipients)
}

async fn get_recipient(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Recipient>, AppError> {
    state
        .store
        .recipients
        .get(id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Recipient not found".to_string()))
}

async fn create_recipient(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<CreateRecipientRequest>,
) -> Result<Json<Recipient>, AppError> {
    let now = Utc::now();
    let recipient = state.store.recipients.insert_with(|id| Recipient {
        id,
        name: payload.name,
        street: payload.street,
        number: payload.number,
        complement: payload.complement.filter(|complement| !complement.is_empty()),
        state: payload.state.to_uppercase(),
        city: payload.city,
        cep: normalize_cep(&payload.cep),
        created_at: now,
        updated_at: now,
    });

    info!(recipient_id = recipient.id, "recipient created");

    Ok(Json(recipient))
}

async fn update_recipient(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ValidatedJson(changes): ValidatedJson<RecipientChanges>,
) -> Result<Json<Recipient>, AppError> {
    let recipient = state
        .store
        .recipients
        .update(id, |recipient| recipient.apply(changes))
        .ok_or_else(|| AppError::NotFound("Recipient not found".to_string()))?;

    info!(recipient_id = recipient.id, "recipient updated");

    Ok(Json(recipient))
}
