//! External collaborators of the routing core.
//!
//! # Data Flow
//! ```text
//! RouteDefinitionProvider (definitions.rs)
//!     tenants, locales, families, overrides, meta pages
//!     → routing::registry builds a RouteTable
//!
//! EntityUrlResolver (entities.rs)
//!     path → (entity type, id)        consulted first by the resolver
//!     (id, entity type) → canonical   used by the reverse builder
//! ```
//!
//! # Design Decisions
//! - Both interfaces are synchronous; latency bounds are the implementor's job
//! - Failures surface as `CollaboratorError`, never as "no route"
//! - Config-backed implementations ship with the crate for the CLI and tests

pub mod definitions;
pub mod entities;

pub use definitions::{ConfigRouteProvider, PageRoute, RouteDefinitionProvider};
pub use entities::{
    EntityRecord, EntityRef, EntityType, EntityUrlResolver, StaticEntityResolver, UrlVariant,
};
