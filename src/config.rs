use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub job_queue_size: usize,
    pub job_max_attempts: u32,
    pub job_retry_delay: Duration,
    pub uploads_dir: PathBuf,
    pub app_url: String,
    pub mail_from: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3333,
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
            job_queue_size: 1024,
            job_max_attempts: 3,
            job_retry_delay: Duration::from_millis(250),
            uploads_dir: PathBuf::from("tmp/uploads"),
            app_url: "http://localhost:3333".to_string(),
            mail_from: "Equipe FastFeet <noreply@fastfeet.com>".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        let log_format = match env::var("LOG_FORMAT") {
            Ok(raw) => parse_log_format(&raw)?,
            Err(_) => defaults.log_format,
        };

        let config = Self {
            http_port: parse_or_default("HTTP_PORT", defaults.http_port)?,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format,
            job_queue_size: parse_or_default("JOB_QUEUE_SIZE", defaults.job_queue_size)?,
            job_max_attempts: parse_or_default("JOB_MAX_ATTEMPTS", defaults.job_max_attempts)?,
            job_retry_delay: parse_millis_or_default(
                "JOB_RETRY_DELAY_MS",
                defaults.job_retry_delay,
            )?,
            uploads_dir: env::var("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.uploads_dir),
            app_url: env::var("APP_URL").unwrap_or(defaults.app_url),
            mail_from: env::var("MAIL_FROM").unwrap_or(defaults.mail_from),
        };

        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would only fail later, at startup.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.job_queue_size == 0 {
            return Err(AppError::Internal(
                "invalid JOB_QUEUE_SIZE: must be at least 1".to_string(),
            ));
        }
        if self.job_max_attempts == 0 {
            return Err(AppError::Internal(
                "invalid JOB_MAX_ATTEMPTS: must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_millis_or_default(key: &str, default: Duration) -> Result<Duration, AppError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}

fn parse_log_format(raw: &str) -> Result<LogFormat, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "compact" | "" => Ok(LogFormat::Compact),
        "json" => Ok(LogFormat::Json),
        other => Err(AppError::Internal(format!(
            "invalid LOG_FORMAT: {other} (expected compact or json)"
        ))),
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
