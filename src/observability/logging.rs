//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Pick pretty or JSON output from config
//! - Keep stdout free for the report; everything goes to stderr
//!
//! `RUST_LOG` wins over `observability.log_level` when set.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::{LogFormat, ObservabilityConfig};

/// Build the filter: `RUST_LOG` if present and valid, else the configured level.
pub fn build_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = build_filter(config);
    let registry = Registry::default().with(filter);

    let result = match config.log_format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("Logging already initialized");
    }
}
