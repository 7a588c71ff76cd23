//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at load / reload):
//!     RouteDefinitionProvider
//!     → registry.rs (families, pages, overrides, index route)
//!     → matcher.rs (rule → anchored regex + reverse segments)
//!     → cache.rs (shared Arc<CompiledRoute> per tenant)
//!     → table.rs (ordered buckets per tenant/locale)
//!     → atomic swap of Arc<RoutingSnapshot>
//!
//! Incoming Request (path, tenant, locale):
//!     → router.rs (snapshot for the request)
//!     → resolver.rs (explicit controller → entity lookup → route scan)
//!     → Return: RouteMatch or NotFound
//!
//! URL Generation (route id, params):
//!     → builder.rs (templated / query / canonical / fallback)
//! ```
//!
//! # Design Decisions
//! - Tables are immutable once published; reloads swap the whole snapshot
//! - Deterministic: insertion order is match priority, empty rule last
//! - The entity URL resolver is authoritative for canonical families

pub mod builder;
pub mod cache;
pub mod error;
pub mod matcher;
pub mod registry;
pub mod resolver;
pub mod router;
pub mod table;
pub mod template;

pub use builder::{BuildOptions, ReverseBuilder};
pub use cache::CompileCache;
pub use error::{CollaboratorError, CompileError, RouteError, RouteResult, ValidationError};
pub use matcher::{compile, validate_template, CompiledRoute, Placeholder, Segment};
pub use registry::{build_snapshot, build_table, RouteRegistry};
pub use resolver::{MatchSource, RequestContext, Resolution, RouteMatch};
pub use router::{Router, RoutingSnapshot};
pub use table::{LocaleId, RouteTable, Scope, TenantId};
pub use template::{KeywordSpec, Params, RouteTemplate};
