//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → RouteRegistry::from_config
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → RouteRegistry::reload_from_config (atomic swap)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    EntityConfig, KeywordConfig, ObservabilityConfig, OverrideConfig, PageConfig, RouteConfig,
    RouterConfig, RoutingSettings, TenantConfig,
};
pub use validation::{validate_config, ConfigValidationError};
pub use watcher::ConfigWatcher;
