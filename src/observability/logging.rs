//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Pick human-readable or JSON output
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level
//! - Re-initialization is reported, not fatal (tests and embedding hosts may
//!   have installed a subscriber already)

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install the global tracing subscriber.
///
/// Returns false if a subscriber was already installed.
pub fn init_logging(config: &ObservabilityConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("route_dispatch={}", config.log_level)));

    let (json, plain) = if config.json {
        (Some(fmt::layer().json()), None)
    } else {
        (None, Some(fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .try_init()
        .is_ok()
}
