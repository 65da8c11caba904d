use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::file::FileSummary;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deliveryman {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub avatar_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Deliveryman as nested in order listings and cancellation mails.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliverymanSummary {
    pub name: String,
    pub email: String,
    pub avatar: Option<FileSummary>,
}
