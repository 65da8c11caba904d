use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub jobs_enqueued_total: IntCounterVec,
    pub jobs_in_queue: IntGauge,
    pub jobs_processed_total: IntCounterVec,
    pub job_latency_seconds: HistogramVec,
    pub orders_canceled_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let jobs_enqueued_total = IntCounterVec::new(
            Opts::new("jobs_enqueued_total", "Total jobs enqueued by key"),
            &["key"],
        )
        .expect("valid jobs_enqueued_total metric");

        let jobs_in_queue = IntGauge::new("jobs_in_queue", "Current number of jobs waiting")
            .expect("valid jobs_in_queue metric");

        let jobs_processed_total = IntCounterVec::new(
            Opts::new("jobs_processed_total", "Total jobs processed by key and outcome"),
            &["key", "outcome"],
        )
        .expect("valid jobs_processed_total metric");

        let job_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "job_latency_seconds",
                "Time spent running a job, retries included, in seconds",
            ),
            &["key"],
        )
        .expect("valid job_latency_seconds metric");

        let orders_canceled_total =
            IntCounter::new("orders_canceled_total", "Orders canceled by problem resolution")
                .expect("valid orders_canceled_total metric");

        registry
            .register(Box::new(jobs_enqueued_total.clone()))
            .expect("register jobs_enqueued_total");
        registry
            .register(Box::new(jobs_in_queue.clone()))
            .expect("register jobs_in_queue");
        registry
            .register(Box::new(jobs_processed_total.clone()))
            .expect("register jobs_processed_total");
        registry
            .register(Box::new(job_latency_seconds.clone()))
            .expect("register job_latency_seconds");
        registry
            .register(Box::new(orders_canceled_total.clone()))
            .expect("register orders_canceled_total");

        Self {
            registry,
            jobs_enqueued_total,
            jobs_in_queue,
            jobs_processed_total,
            job_latency_seconds,
            orders_canceled_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
