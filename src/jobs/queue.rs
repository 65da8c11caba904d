use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::jobs::Job;
use crate::observability::metrics::Metrics;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("job queue is closed")]
    Closed,
}

/// Confirmation that a job was accepted for later execution.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JobReceipt {
    pub id: Uuid,
    pub key: &'static str,
    pub enqueued_at: DateTime<Utc>,
}

/// A job together with the receipt handed back to whoever enqueued it.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub receipt: JobReceipt,
    pub job: Job,
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: Job) -> Result<JobReceipt, QueueError>;
}

/// Bounded in-process queue drained by [`crate::jobs::worker::run_job_worker`].
/// A full queue makes `enqueue` wait.
pub struct ChannelQueue {
    tx: mpsc::Sender<QueuedJob>,
    metrics: Metrics,
}

impl ChannelQueue {
    pub fn new(capacity: usize, metrics: Metrics) -> (Self, mpsc::Receiver<QueuedJob>) {
        // tokio panics on a zero-capacity bounded channel.
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx, metrics }, rx)
    }
}

#[async_trait]
impl JobQueue for ChannelQueue {
    async fn enqueue(&self, job: Job) -> Result<JobReceipt, QueueError> {
        let receipt = JobReceipt {
            id: Uuid::new_v4(),
            key: job.key(),
            enqueued_at: Utc::now(),
        };

        // Counted before sending so the worker never decrements first.
        self.metrics.jobs_in_queue.inc();
        let sent = self
            .tx
            .send(QueuedJob {
                receipt: receipt.clone(),
                job,
            })
            .await;
        if sent.is_err() {
            self.metrics.jobs_in_queue.dec();
            return Err(QueueError::Closed);
        }

        self.metrics
            .jobs_enqueued_total
            .with_label_values(&[receipt.key])
            .inc();

        Ok(receipt)
    }
}
