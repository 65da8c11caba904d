use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::models::deliveryman::{Deliveryman, DeliverymanSummary};
use crate::models::recipient::{Recipient, RecipientSummary};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport failed: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: Mail) -> Result<(), MailError>;
}

/// Writes every mail to the log instead of delivering it.
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: Mail) -> Result<(), MailError> {
        info!(
            from = %self.from,
            to = %mail.to,
            subject = %mail.subject,
            body = %mail.body,
            "mail sent"
        );
        Ok(())
    }
}

/// Keeps sent mails in memory. Can be told to fail its first sends.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<Mail>>,
    failures_left: AtomicU32,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(times: u32) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failures_left: AtomicU32::new(times),
        }
    }

    pub fn sent(&self) -> Vec<Mail> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, mail: Mail) -> Result<(), MailError> {
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failed {
            return Err(MailError::Transport("simulated failure".to_string()));
        }

        match self.sent.lock() {
            Ok(mut sent) => sent.push(mail),
            Err(poisoned) => poisoned.into_inner().push(mail),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderMailPayload {
    pub deliveryman: Deliveryman,
    pub recipient: Recipient,
    pub product: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CancelationMailPayload {
    pub deliveryman: DeliverymanSummary,
    pub recipient: RecipientSummary,
    pub product: String,
    pub problem: String,
}

/// Tells a deliveryman a new order was assigned to them.
pub struct OrderMail;

impl OrderMail {
    pub const KEY: &'static str = "OrderMail";

    pub async fn handle(payload: &OrderMailPayload, mailer: &dyn Mailer) -> Result<(), MailError> {
        let recipient = &payload.recipient;
        let body = format!(
            "Olá {name},\n\nUma nova encomenda está disponível para retirada.\n\n\
             Produto: {product}\nDestinatário: {recipient_name}\nEndereço: {address}\n",
            name = payload.deliveryman.name,
            product = payload.product,
            recipient_name = recipient.name,
            address = format_address(
                &recipient.street,
                &recipient.number,
                recipient.complement.as_deref(),
                &recipient.city,
                &recipient.state,
                &recipient.cep,
            ),
        );

        mailer
            .send(Mail {
                to: addressee(&payload.deliveryman.name, &payload.deliveryman.email),
                subject: "Nova encomenda".to_string(),
                body,
            })
            .await
    }
}

/// Tells a deliveryman an order was canceled because of a reported problem.
pub struct CancelationMail;

impl CancelationMail {
    pub const KEY: &'static str = "CancelationMail";

    pub async fn handle(
        payload: &CancelationMailPayload,
        mailer: &dyn Mailer,
    ) -> Result<(), MailError> {
        let recipient = &payload.recipient;
        let body = format!(
            "Olá {name},\n\nA encomenda abaixo foi cancelada.\n\n\
             Produto: {product}\nDestinatário: {recipient_name}\nEndereço: {address}\n\
             Problema: {problem}\n",
            name = payload.deliveryman.name,
            product = payload.product,
            recipient_name = recipient.name,
            address = format_address(
                &recipient.street,
                &recipient.number,
                recipient.complement.as_deref(),
                &recipient.city,
                &recipient.state,
                &recipient.cep,
            ),
            problem = payload.problem,
        );

        mailer
            .send(Mail {
                to: addressee(&payload.deliveryman.name, &payload.deliveryman.email),
                subject: "Encomenda cancelada".to_string(),
                body,
            })
            .await
    }
}

fn addressee(name: &str, email: &str) -> String {
    format!("{name} <{email}>")
}

fn format_address(
    street: &str,
    number: &str,
    complement: Option<&str>,
    city: &str,
    state: &str,
    cep: &str,
) -> String {
    match complement {
        Some(complement) if !complement.is_empty() => {
            format!("{street}, {number} ({complement}) - {city}/{state} - CEP {cep}")
        }
        _ => format!("{street}, {number} - {city}/{state} - CEP {cep}"),
    }
}
