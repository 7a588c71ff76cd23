//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Init logging → Build route registry
//!
//! Shutdown (shutdown.rs):
//!     Signal received → watch loop stops → config watcher dropped → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then logging, then routes
//! - Any startup error is fatal

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{start, StartupError};
