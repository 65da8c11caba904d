use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::deliveryman::DeliverymanSummary;
use crate::models::recipient::RecipientSummary;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: i64,
    pub product: String,
    pub deliveryman_id: i64,
    pub recipient_id: i64,
    pub signature_id: Option<i64>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Neither delivered nor canceled.
    pub fn is_active(&self) -> bool {
        self.end_date.is_none() && self.canceled_at.is_none()
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled_at.is_some()
    }
}

/// Order listing row with its recipient and deliveryman joined in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderDetails {
    pub id: i64,
    pub product: String,
    pub start_date: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub recipient: Option<RecipientSummary>,
    pub deliveryman: Option<DeliverymanSummary>,
}
