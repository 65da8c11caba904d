use reqwest::Url;
use thiserror::Error;
use tracing::warn;

use crate::client::recipients::{
    RecipientUpdate, RecipientsAction, get_recipients_failure, get_recipients_success,
    update_recipients_failure, update_recipients_success,
};
use crate::models::recipient::Recipient;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Performs the API call behind each request action and answers with the
/// matching success or failure action.
#[derive(Debug, Clone)]
pub struct RecipientsEffects {
    http: reqwest::Client,
    base_url: String,
}

impl RecipientsEffects {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `None` for actions that need no side effect.
    pub async fn run(&self, action: &RecipientsAction) -> Option<RecipientsAction> {
        match action {
            RecipientsAction::GetRequest { page, name } => {
                Some(match self.fetch_recipients(*page, name).await {
                    Ok(recipients) => get_recipients_success(recipients),
                    Err(err) => {
                        warn!(error = %err, page, "failed to load recipients");
                        get_recipients_failure()
                    }
                })
            }
            RecipientsAction::UpdateRequest { data } => {
                Some(match self.update_recipient(data).await {
                    Ok(_) => update_recipients_success(),
                    Err(err) => {
                        warn!(error = %err, recipient_id = data.id, "failed to update recipient");
                        update_recipients_failure()
                    }
                })
            }
            _ => None,
        }
    }

    pub async fn fetch_recipients(
        &self,
        page: u32,
        name: &str,
    ) -> Result<Vec<Recipient>, ClientError> {
        let url = Url::parse_with_params(
            &format!("{}/recipients", self.base_url),
            &[("page", page.to_string()), ("q", name.to_string())],
        )
        .map_err(|err| ClientError::InvalidUrl(err.to_string()))?;

        let recipients = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Recipient>>()
            .await?;

        Ok(recipients)
    }

    pub async fn update_recipient(&self, data: &RecipientUpdate) -> Result<Recipient, ClientError> {
        let url = format!("{}/recipients/{}", self.base_url, data.id);

        let recipient = self
            .http
            .put(url)
            .json(&data.changes)
            .send()
            .await?
            .error_for_status()?
            .json::<Recipient>()
            .await?;

        Ok(recipient)
    }
}
