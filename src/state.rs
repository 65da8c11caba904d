use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::Config;
use crate::jobs::queue::{ChannelQueue, JobQueue, QueuedJob};
use crate::observability::metrics::Metrics;
use crate::store::Store;

/// Everything a request handler may touch. Built once at startup and shared
/// through axum's `State` extractor.
pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub queue: Arc<dyn JobQueue>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: Config, queue: Arc<dyn JobQueue>, metrics: Metrics) -> Self {
        Self {
            config,
            store: Store::new(),
            queue,
            metrics,
        }
    }

    /// State backed by a [`ChannelQueue`]; the receiver feeds the job worker.
    pub fn with_channel_queue(config: Config) -> (Self, mpsc::Receiver<QueuedJob>) {
        let metrics = Metrics::new();
        let (queue, job_rx) = ChannelQueue::new(config.job_queue_size, metrics.clone());
        (Self::new(config, Arc::new(queue), metrics), job_rx)
    }
}
