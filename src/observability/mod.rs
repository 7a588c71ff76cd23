//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! routing / config produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and gauges via the metrics facade)
//!
//! Consumers:
//!     → stdout (plain or JSON lines)
//!     → whatever metrics recorder the host installs
//! ```
//!
//! # Design Decisions
//! - Structured fields (route_id, tenant, locale) instead of formatted text
//! - Metrics are cheap no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
