//! Route table loading and publication.
//!
//! # Responsibilities
//! - Turn a `RouteDefinitionProvider` into a complete `RouteTable`
//! - Publish tables through an atomic pointer swap
//! - Share compiled routes across locales and reloads via `CompileCache`
//!
//! # Loading order (per tenant, per locale)
//! 1. Route families: built-ins with extension routes merged over them
//! 2. Meta-page routes, longest `url_rewrite` first (templated routing only)
//! 3. Custom overrides, replacing a family's pattern in place (templated
//!    routing only)
//! 4. The empty `index` route, always last
//!
//! # Design Decisions
//! - A template that fails to compile is logged and skipped; the rest of
//!   the table is still published
//! - Collaborator failures abort the build and keep the current table
//! - Readers see either the old or the new snapshot, never a partial one

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::{RouterConfig, RoutingSettings};
use crate::observability::metrics;
use crate::providers::{ConfigRouteProvider, EntityUrlResolver, RouteDefinitionProvider, StaticEntityResolver};
use crate::routing::cache::CompileCache;
use crate::routing::error::{CollaboratorError, RouteResult};
use crate::routing::matcher::validate_template;
use crate::routing::router::{Router, RoutingSnapshot};
use crate::routing::table::{RouteTable, Scope};
use crate::routing::template::{empty_route, RouteTemplate};

fn add_route(table: &mut RouteTable, cache: &CompileCache, scope: Scope, template: RouteTemplate) {
    let route_id = template.route_id.clone();
    match cache.get_or_compile(scope.tenant, template) {
        Ok(route) => table.insert(scope, route),
        Err(error) => {
            metrics::record_rejected_template();
            tracing::warn!(
                route_id = %route_id,
                tenant = %scope.tenant,
                locale = %scope.locale,
                error = %error,
                "Route template rejected"
            );
        }
    }
}

/// Build the route table for every tenant and locale the provider knows.
pub fn build_table(
    provider: &dyn RouteDefinitionProvider,
    templated_routing: bool,
    cache: &CompileCache,
) -> Result<RouteTable, CollaboratorError> {
    let mut table = RouteTable::new();

    for tenant in provider.tenants()? {
        let families = provider.route_definitions(tenant)?;
        let mut pages = if templated_routing {
            provider.page_routes(tenant)?
        } else {
            Vec::new()
        };
        pages.sort_by(|a, b| b.url_rewrite.len().cmp(&a.url_rewrite.len()));

        for locale in provider.locales(tenant)? {
            let scope = Scope { tenant, locale };

            for template in families.values() {
                add_route(&mut table, cache, scope, template.clone());
            }

            if templated_routing {
                for page in pages
                    .iter()
                    .filter(|p| p.locale == locale && !p.url_rewrite.is_empty())
                {
                    add_route(&mut table, cache, scope, page.to_template());
                }
                for (route_id, family) in &families {
                    let Some(rule) = provider.override_rule(route_id, scope)? else {
                        continue;
                    };
                    match validate_template(family, &rule, templated_routing) {
                        Ok(()) => add_route(&mut table, cache, scope, family.with_pattern(rule)),
                        Err(error) => {
                            metrics::record_rejected_template();
                            tracing::warn!(
                                route_id = %route_id,
                                tenant = %scope.tenant,
                                locale = %scope.locale,
                                error = %error,
                                "Override rule rejected, keeping family rule"
                            );
                        }
                    }
                }
            }

            match cache.get_or_compile(tenant, empty_route()) {
                Ok(route) => table.push_last(scope, route),
                Err(error) => tracing::error!(error = %error, "Index route failed to compile"),
            }

            tracing::info!(
                tenant = %tenant,
                locale = %locale,
                routes = table.routes(scope).len(),
                "Route table built"
            );
        }

        table.set_families(tenant, families);
    }

    Ok(table)
}

/// Build a complete snapshot without publishing it.
pub fn build_snapshot(
    provider: &dyn RouteDefinitionProvider,
    settings: RoutingSettings,
    entities: Arc<dyn EntityUrlResolver>,
    cache: &CompileCache,
) -> RouteResult<RoutingSnapshot> {
    let table = build_table(provider, settings.templated_routing, cache)?;
    let mut base_uris = HashMap::new();
    for tenant in provider.tenants()? {
        base_uris.insert(tenant, provider.base_uri(tenant)?);
    }
    Ok(RoutingSnapshot {
        table,
        settings,
        base_uris,
        entities,
    })
}

/// Owner of the live routing snapshot.
pub struct RouteRegistry {
    current: ArcSwap<RoutingSnapshot>,
    cache: CompileCache,
}

impl RouteRegistry {
    pub fn new(
        provider: &dyn RouteDefinitionProvider,
        settings: RoutingSettings,
        entities: Arc<dyn EntityUrlResolver>,
    ) -> RouteResult<Self> {
        let cache = CompileCache::new();
        let snapshot = build_snapshot(provider, settings, entities, &cache)?;
        metrics::record_route_count(snapshot.table.route_count());
        Ok(Self {
            current: ArcSwap::from_pointee(snapshot),
            cache,
        })
    }

    /// Registry over the config-backed provider and static entity resolver.
    pub fn from_config(config: &RouterConfig) -> RouteResult<Self> {
        let provider = ConfigRouteProvider::new(config.clone());
        let entities = Arc::new(StaticEntityResolver::from_config(&config.entities));
        Self::new(&provider, config.settings.clone(), entities)
    }

    /// Rebuild from `provider` and publish. On error the current snapshot stays.
    pub fn reload(
        &self,
        provider: &dyn RouteDefinitionProvider,
        settings: RoutingSettings,
        entities: Arc<dyn EntityUrlResolver>,
    ) -> RouteResult<()> {
        match build_snapshot(provider, settings, entities, &self.cache) {
            Ok(snapshot) => {
                self.publish(snapshot);
                metrics::record_table_reload("ok");
                Ok(())
            }
            Err(error) => {
                metrics::record_table_reload("error");
                tracing::error!(error = %error, "Route table reload failed, keeping current table");
                Err(error)
            }
        }
    }

    pub fn reload_from_config(&self, config: &RouterConfig) -> RouteResult<()> {
        let provider = ConfigRouteProvider::new(config.clone());
        let entities = Arc::new(StaticEntityResolver::from_config(&config.entities));
        self.reload(&provider, config.settings.clone(), entities)
    }

    /// Swap in a new snapshot and drop compiled routes nothing uses any more.
    pub fn publish(&self, snapshot: RoutingSnapshot) {
        let routes = snapshot.table.route_count();
        self.current.store(Arc::new(snapshot));
        self.cache.prune();
        metrics::record_route_count(routes);
        tracing::info!(routes, "Route table published");
    }

    pub fn snapshot(&self) -> Arc<RoutingSnapshot> {
        self.current.load_full()
    }

    /// Router over the snapshot current at call time.
    pub fn router(&self) -> Router {
        Router::new(self.snapshot())
    }

    pub fn cache(&self) -> &CompileCache {
        &self.cache
    }
}
