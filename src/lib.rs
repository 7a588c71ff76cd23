//! Bidirectional URL routing engine.
//!
//! Resolves request paths to a route and bound parameters, and builds URLs
//! back from a route id and parameters, over per-tenant, per-locale route
//! tables compiled from path templates.

#[macro_use]
mod macros;

pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod providers;
pub mod routing;

pub use config::schema::RouterConfig;
pub use lifecycle::Shutdown;
pub use routing::{Resolution, RouteError, RouteRegistry, Router};
