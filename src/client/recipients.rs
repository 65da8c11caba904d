use serde::{Deserialize, Serialize};

use crate::models::recipient::{Recipient, RecipientChanges};

/// Recipient edit sent with [`RecipientsAction::UpdateRequest`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipientUpdate {
    pub id: i64,
    #[serde(flatten)]
    pub changes: RecipientChanges,
}

/// Serialized as `{"type": "@recipients/...", "payload": {...}}`; actions
/// without data carry no `payload` key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum RecipientsAction {
    #[serde(rename = "@recipients/GET_REQUEST")]
    GetRequest { page: u32, name: String },
    #[serde(rename = "@recipients/GET_SUCCESS")]
    GetSuccess { recipients: Vec<Recipient> },
    #[serde(rename = "@recipients/GET_FAILURE")]
    GetFailure,
    #[serde(rename = "@recipients/UPDATE_REQUEST")]
    UpdateRequest { data: RecipientUpdate },
    #[serde(rename = "@recipients/UPDATE_SUCCESS")]
    UpdateSuccess,
    #[serde(rename = "@recipients/UPDATE_FAILURE")]
    UpdateFailure,
}

pub fn get_recipients_request(page: u32, name: impl Into<String>) -> RecipientsAction {
    RecipientsAction::GetRequest {
        page,
        name: name.into(),
    }
}

pub fn get_recipients_success(recipients: Vec<Recipient>) -> RecipientsAction {
    RecipientsAction::GetSuccess { recipients }
}

pub fn get_recipients_failure() -> RecipientsAction {
    RecipientsAction::GetFailure
}

pub fn update_recipients_request(data: RecipientUpdate) -> RecipientsAction {
    RecipientsAction::UpdateRequest { data }
}

pub fn update_recipients_success() -> RecipientsAction {
    RecipientsAction::UpdateSuccess
}

pub fn update_recipients_failure() -> RecipientsAction {
    RecipientsAction::UpdateFailure
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipientsState {
    pub recipients: Vec<Recipient>,
    pub page: u32,
    pub loading: bool,
    pub error: bool,
}

/// Pages after the first are appended, the first page replaces the list.
pub fn reduce(mut state: RecipientsState, action: &RecipientsAction) -> RecipientsState {
    match action {
        RecipientsAction::GetRequest { page, .. } => {
            state.page = *page;
            state.loading = true;
            state.error = false;
        }
        RecipientsAction::GetSuccess { recipients } => {
            if state.page > 1 {
                state.recipients.extend(recipients.iter().cloned());
            } else {
                state.recipients = recipients.clone();
            }
            state.loading = false;
        }
        RecipientsAction::UpdateRequest { .. } => {
            state.loading = true;
            state.error = false;
        }
        RecipientsAction::UpdateSuccess => {
            state.loading = false;
        }
        RecipientsAction::GetFailure | RecipientsAction::UpdateFailure => {
            state.loading = false;
            state.error = true;
        }
    }
    state
}
