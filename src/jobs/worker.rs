use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::jobs::Job;
use crate::jobs::mail::{CancelationMail, MailError, Mailer, OrderMail};
use crate::jobs::queue::QueuedJob;
use crate::observability::metrics::Metrics;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(250),
        }
    }
}

pub async fn run_job_worker(
    mut job_rx: mpsc::Receiver<QueuedJob>,
    mailer: Arc<dyn Mailer>,
    metrics: Metrics,
    policy: RetryPolicy,
) {
    info!("job worker started");

    while let Some(queued) = job_rx.recv().await {
        metrics.jobs_in_queue.dec();

        let key = queued.receipt.key;
        let start = Instant::now();
        let outcome = match process_with_retry(&queued, mailer.as_ref(), policy).await {
            Ok(()) => "success",
            Err(err) => {
                error!(
                    job_id = %queued.receipt.id,
                    key,
                    attempts = policy.max_attempts,
                    error = %err,
                    "job failed; giving up"
                );
                "error"
            }
        };

        metrics
            .job_latency_seconds
            .with_label_values(&[key])
            .observe(start.elapsed().as_secs_f64());
        metrics
            .jobs_processed_total
            .with_label_values(&[key, outcome])
            .inc();
    }

    warn!("job worker stopped: queue channel closed");
}

async fn process_with_retry(
    queued: &QueuedJob,
    mailer: &dyn Mailer,
    policy: RetryPolicy,
) -> Result<(), MailError> {
    let mut attempt = 1;
    loop {
        match process_job(&queued.job, mailer).await {
            Ok(()) => {
                info!(
                    job_id = %queued.receipt.id,
                    key = queued.receipt.key,
                    attempt,
                    "job processed"
                );
                return Ok(());
            }
            Err(err) if attempt < policy.max_attempts => {
                warn!(
                    job_id = %queued.receipt.id,
                    key = queued.receipt.key,
                    attempt,
                    error = %err,
                    "job failed; retrying"
                );
                attempt += 1;
                sleep(policy.delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

async fn process_job(job: &Job, mailer: &dyn Mailer) -> Result<(), MailError> {
    match job {
        Job::OrderCreated(payload) => OrderMail::handle(payload, mailer).await,
        Job::OrderCanceled(payload) => CancelationMail::handle(payload, mailer).await,
    }
}
