use tracing_subscriber::EnvFilter;

use crate::config::{Config, LogFormat};

pub fn init_tracing(config: &Config) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false);

    match config.log_format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }
}
