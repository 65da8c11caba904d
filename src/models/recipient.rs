use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipient {
    pub id: i64,
    pub name: String,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub state: String,
    pub city: String,
    pub cep: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recipient {
    pub fn apply(&mut self, changes: RecipientChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(street) = changes.street {
            self.street = street;
        }
        if let Some(number) = changes.number {
            self.number = number;
        }
        if let Some(complement) = changes.complement {
            self.complement = Some(complement);
        }
        if let Some(state) = changes.state {
            self.state = state.to_uppercase();
        }
        if let Some(city) = changes.city {
            self.city = city;
        }
        if let Some(cep) = changes.cep {
            self.cep = normalize_cep(&cep);
        }
        self.updated_at = Utc::now();
    }
}

/// Recipient address as nested in order listings and mails. Same fields the
/// recipient row has, minus `updated_at`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipientSummary {
    pub id: i64,
    pub name: String,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub state: String,
    pub city: String,
    pub cep: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Recipient> for RecipientSummary {
    fn from(recipient: &Recipient) -> Self {
        Self {
            id: recipient.id,
            name: recipient.name.clone(),
            street: recipient.street.clone(),
            number: recipient.number.clone(),
            complement: recipient.complement.clone(),
            state: recipient.state.clone(),
            city: recipient.city.clone(),
            cep: recipient.cep.clone(),
            created_at: recipient.created_at,
        }
    }
}

/// Partial update of a recipient. Shared by the `PUT /recipients/:id` handler
/// and the client-side update action.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
pub struct RecipientChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(equal = 2))]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom = "validate_cep")]
    pub cep: Option<String>,
}

/// A CEP is eight digits, optionally written as `00000-000`.
pub fn validate_cep(cep: &str) -> Result<(), ValidationError> {
    let digits = normalize_cep(cep);
    if digits.len() == 8 && digits.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("cep"))
    }
}

pub fn normalize_cep(cep: &str) -> String {
    cep.trim().replace('-', "")
}
