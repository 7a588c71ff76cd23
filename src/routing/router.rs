//! Per-request routing façade.
//!
//! # Responsibilities
//! - Hold one immutable routing snapshot for the lifetime of a request
//! - Expose resolve, build, has_route, has_keyword and validate_template
//! - Fill request contexts from the snapshot's settings
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Cheap to clone: the snapshot is behind an `Arc`
//! - A reload never changes a `Router` already handed out

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::RoutingSettings;
use crate::providers::EntityUrlResolver;
use crate::routing::builder::{BuildOptions, ReverseBuilder};
use crate::routing::error::{RouteResult, ValidationError};
use crate::routing::matcher;
use crate::routing::resolver::{RequestContext, Resolution, Resolver};
use crate::routing::table::{RouteTable, Scope, TenantId};
use crate::routing::template::Params;

/// Everything a request needs, published as one unit.
pub struct RoutingSnapshot {
    pub table: RouteTable,
    pub settings: RoutingSettings,
    pub base_uris: HashMap<TenantId, String>,
    pub entities: Arc<dyn EntityUrlResolver>,
}

impl fmt::Debug for RoutingSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingSnapshot")
            .field("routes", &self.table.route_count())
            .field("settings", &self.settings)
            .field("base_uris", &self.base_uris)
            .finish_non_exhaustive()
    }
}

/// Read-only view over one routing snapshot.
#[derive(Debug, Clone)]
pub struct Router {
    snapshot: Arc<RoutingSnapshot>,
}

impl Router {
    pub fn new(snapshot: Arc<RoutingSnapshot>) -> Self {
        Self { snapshot }
    }

    pub fn settings(&self) -> &RoutingSettings {
        &self.snapshot.settings
    }

    pub fn table(&self) -> &RouteTable {
        &self.snapshot.table
    }

    /// Request context for `path` with the configured routing switches.
    pub fn request(&self, path: &str, scope: Scope) -> RequestContext {
        RequestContext {
            path: path.to_string(),
            scope,
            templated_routing: self.snapshot.settings.templated_routing,
            multi_locale: self.snapshot.settings.multi_locale,
            base_uri: self
                .snapshot
                .base_uris
                .get(&scope.tenant)
                .cloned()
                .unwrap_or_else(|| "/".to_string()),
        }
    }

    pub fn resolve(&self, ctx: &RequestContext) -> RouteResult<Resolution> {
        Resolver::new(
            &self.snapshot.table,
            self.snapshot.entities.as_ref(),
            &self.snapshot.settings,
        )
        .resolve(ctx)
    }

    pub fn resolve_path(&self, path: &str, scope: Scope) -> RouteResult<Resolution> {
        self.resolve(&self.request(path, scope))
    }

    /// Reverse-build a URL without anchor.
    pub fn build(
        &self,
        route_id: &str,
        scope: Scope,
        params: &Params,
        templated: bool,
    ) -> RouteResult<String> {
        self.build_with_anchor(route_id, scope, params, templated, "")
    }

    pub fn build_with_anchor(
        &self,
        route_id: &str,
        scope: Scope,
        params: &Params,
        templated: bool,
        anchor: &str,
    ) -> RouteResult<String> {
        let options = BuildOptions {
            templated,
            multi_locale: self.snapshot.settings.multi_locale,
            anchor,
        };
        ReverseBuilder::new(&self.snapshot.table, self.snapshot.entities.as_ref())
            .build(scope, route_id, params, options)
    }

    pub fn has_route(&self, scope: Scope, route_id: &str) -> bool {
        self.snapshot.table.has_route(scope, route_id)
    }

    pub fn has_keyword(&self, scope: Scope, route_id: &str, keyword: &str) -> bool {
        self.snapshot.table.has_keyword(scope, route_id, keyword)
    }

    /// Check a custom rule for `route_id` against the tenant's route family.
    pub fn validate_template(
        &self,
        tenant: TenantId,
        route_id: &str,
        rule: &str,
    ) -> Result<(), ValidationError> {
        let family = self
            .snapshot
            .table
            .family(tenant, route_id)
            .ok_or_else(|| ValidationError::UnknownRoute {
                route_id: route_id.to_string(),
            })?;
        matcher::validate_template(family, rule, self.snapshot.settings.templated_routing)
    }
}
