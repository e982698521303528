//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber for applications and the CLI
//! - Pick human-readable or JSON output
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - A second initialization is reported, not fatal

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install the global subscriber.
///
/// Returns false if a subscriber was already installed.
pub fn init_logging(config: &ObservabilityConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let json = config.json_logs.then(|| fmt::layer().json());
    let text = (!config.json_logs).then(fmt::layer);

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .try_init()
        .is_ok()
}
