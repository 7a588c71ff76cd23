//! Routing metrics.
//!
//! # Metrics
//! - `router_resolutions_total` (counter): resolve outcomes by `outcome`
//!   (entity, route, default, explicit, not_found, error)
//! - `router_builds_total` (counter): reverse builds by `mode`
//!   (templated, query, canonical, fallback)
//! - `router_rejected_templates_total` (counter): rules skipped at table build
//! - `router_table_reloads_total` (counter): table publishes by `result`
//! - `router_routes` (gauge): compiled routes in the live table
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Label values are static strings only

use metrics::{counter, gauge};

pub fn record_resolution(outcome: &'static str) {
    counter!("router_resolutions_total", "outcome" => outcome).increment(1);
}

pub fn record_build(mode: &'static str) {
    counter!("router_builds_total", "mode" => mode).increment(1);
}

pub fn record_rejected_template() {
    counter!("router_rejected_templates_total").increment(1);
}

pub fn record_table_reload(result: &'static str) {
    counter!("router_table_reloads_total", "result" => result).increment(1);
}

pub fn record_route_count(count: usize) {
    gauge!("router_routes").set(count as f64);
}
