//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging
//! - Build the route registry
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Logging starts after config load so the configured level applies

use std::path::Path;

use thiserror::Error;

use crate::config::{load_config, ConfigError, RouterConfig};
use crate::observability::logging::init_logging;
use crate::routing::{RouteError, RouteRegistry};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("route table: {0}")]
    Routing(#[from] RouteError),
}

/// Load `path` (or defaults), start logging and build the registry.
pub fn start(path: Option<&Path>) -> Result<(RouterConfig, RouteRegistry), StartupError> {
    let config = match path {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };
    init_logging(&config.observability);

    tracing::info!(
        tenants = config.tenants.len(),
        routes = config.routes.len(),
        overrides = config.overrides.len(),
        templated_routing = config.settings.templated_routing,
        "Configuration loaded"
    );

    let registry = RouteRegistry::from_config(&config)?;
    Ok((config, registry))
}
