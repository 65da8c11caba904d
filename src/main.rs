use std::sync::Arc;

use delivery_api::api;
use delivery_api::config::Config;
use delivery_api::error::AppError;
use delivery_api::jobs::mail::LogMailer;
use delivery_api::jobs::worker::{RetryPolicy, run_job_worker};
use delivery_api::observability::logging::init_tracing;
use delivery_api::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;
    init_tracing(&config);

    let (app_state, job_rx) = AppState::with_channel_queue(config.clone());
    let shared_state = Arc::new(app_state);

    let mailer = Arc::new(LogMailer::new(config.mail_from.clone()));
    tokio::spawn(run_job_worker(
        job_rx,
        mailer,
        shared_state.metrics.clone(),
        RetryPolicy {
            max_attempts: config.job_max_attempts,
            delay: config.job_retry_delay,
        },
    ));

    let app = api::rest::router(shared_state.clone());

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(
        http_port = config.http_port,
        uploads_dir = %config.uploads_dir.display(),
        "http server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
