//! Background jobs: the enqueue capability handlers use, the mail jobs the
//! worker runs, and the worker loop itself.

pub mod mail;
pub mod queue;
pub mod worker;

use serde::{Deserialize, Serialize};

use crate::jobs::mail::{CancelationMail, CancelationMailPayload, OrderMail, OrderMailPayload};

/// Every kind of job the worker knows how to run. Serialized as
/// `{"key": ..., "payload": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "key", content = "payload")]
pub enum Job {
    #[serde(rename = "OrderMail")]
    OrderCreated(OrderMailPayload),
    #[serde(rename = "CancelationMail")]
    OrderCanceled(CancelationMailPayload),
}

impl Job {
    pub fn key(&self) -> &'static str {
        match self {
            Job::OrderCreated(_) => OrderMail::KEY,
            Job::OrderCanceled(_) => CancelationMail::KEY,
        }
    }
}
