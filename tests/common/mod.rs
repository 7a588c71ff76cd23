//! Shared fixtures for routing integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use route_dispatch::config::RoutingSettings;
use route_dispatch::providers::{
    EntityRecord, EntityRef, EntityType, EntityUrlResolver, PageRoute, RouteDefinitionProvider,
    StaticEntityResolver, UrlVariant,
};
use route_dispatch::routing::{
    CollaboratorError, KeywordSpec, LocaleId, Params, RouteRegistry, RouteTemplate, Scope, TenantId,
};

/// In-memory definition provider: one tenant, fixed locales.
#[derive(Default)]
pub struct MemoryProvider {
    pub locales: Vec<LocaleId>,
    /// Replaces the built-in families when set.
    pub defaults: Option<Vec<RouteTemplate>>,
    pub extensions: Vec<RouteTemplate>,
    pub overrides: Vec<(String, String)>,
    pub pages: Vec<PageRoute>,
    pub base_uri: Option<String>,
    pub unavailable: bool,
}

impl MemoryProvider {
    pub fn with_routes(routes: Vec<RouteTemplate>) -> Self {
        Self {
            locales: vec![LocaleId(1)],
            defaults: Some(Vec::new()),
            extensions: routes,
            ..Default::default()
        }
    }

    fn check(&self) -> Result<(), CollaboratorError> {
        if self.unavailable {
            Err(CollaboratorError::new("route definitions", "connection refused"))
        } else {
            Ok(())
        }
    }
}

impl RouteDefinitionProvider for MemoryProvider {
    fn tenants(&self) -> Result<Vec<TenantId>, CollaboratorError> {
        self.check()?;
        Ok(vec![TenantId(1)])
    }

    fn locales(&self, _tenant: TenantId) -> Result<Vec<LocaleId>, CollaboratorError> {
        Ok(self.locales.clone())
    }

    fn base_uri(&self, _tenant: TenantId) -> Result<String, CollaboratorError> {
        Ok(self.base_uri.clone().unwrap_or_else(|| "/".to_string()))
    }

    fn default_routes(&self, _tenant: TenantId) -> Result<Vec<RouteTemplate>, CollaboratorError> {
        Ok(self
            .defaults
            .clone()
            .unwrap_or_else(route_dispatch::routing::template::default_routes))
    }

    fn extension_routes(&self, _tenant: TenantId) -> Result<Vec<RouteTemplate>, CollaboratorError> {
        Ok(self.extensions.clone())
    }

    fn override_rule(&self, route_id: &str, _scope: Scope) -> Result<Option<String>, CollaboratorError> {
        Ok(self
            .overrides
            .iter()
            .find(|(id, _)| id == route_id)
            .map(|(_, rule)| rule.clone()))
    }

    fn page_routes(&self, _tenant: TenantId) -> Result<Vec<PageRoute>, CollaboratorError> {
        Ok(self.pages.clone())
    }
}

/// Entity resolver that counts lookups.
#[derive(Default)]
pub struct CountingEntities {
    inner: StaticEntityResolver,
    pub lookups: AtomicUsize,
    pub reverse_lookups: AtomicUsize,
}

impl CountingEntities {
    pub fn new(records: Vec<EntityRecord>) -> Self {
        Self {
            inner: StaticEntityResolver::new(records),
            ..Default::default()
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl EntityUrlResolver for CountingEntities {
    fn lookup(&self, path: &str, scope: Scope) -> Result<Option<EntityRef>, CollaboratorError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.lookup(path, scope)
    }

    fn reverse_lookup(
        &self,
        id: &str,
        entity: EntityType,
        scope: Scope,
        variant: UrlVariant,
    ) -> Result<Option<String>, CollaboratorError> {
        self.reverse_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.reverse_lookup(id, entity, scope, variant)
    }

    fn page_controller(&self, page_id: u64, scope: Scope) -> Result<Option<String>, CollaboratorError> {
        self.inner.page_controller(page_id, scope)
    }
}

/// Entity resolver whose backing store is down.
pub struct FailingEntities;

impl EntityUrlResolver for FailingEntities {
    fn lookup(&self, _path: &str, _scope: Scope) -> Result<Option<EntityRef>, CollaboratorError> {
        Err(CollaboratorError::new("entity resolver", "store offline"))
    }

    fn reverse_lookup(
        &self,
        _id: &str,
        _entity: EntityType,
        _scope: Scope,
        _variant: UrlVariant,
    ) -> Result<Option<String>, CollaboratorError> {
        Err(CollaboratorError::new("entity resolver", "store offline"))
    }
}

pub fn scope() -> Scope {
    Scope::new(1, 1)
}

pub fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn record(path: &str, entity: EntityType, id: u64) -> EntityRecord {
    EntityRecord {
        scope: scope(),
        path: path.to_string(),
        entity,
        id,
        canonical: true,
        page: None,
    }
}

/// `{id}-{rewrite}.html` with `id` bound to `id_category`.
pub fn sale_route() -> RouteTemplate {
    RouteTemplate::new("sale_rule", "{id}-{rewrite}.html", Some("sale"))
        .keyword(KeywordSpec::new("id", "[0-9]+").bound("id_category"))
        .keyword(KeywordSpec::new("rewrite", r"[_a-zA-Z0-9\pL\pS-]*"))
}

pub fn registry(provider: &MemoryProvider, entities: Arc<dyn EntityUrlResolver>) -> RouteRegistry {
    RouteRegistry::new(provider, RoutingSettings::default(), entities).unwrap()
}

pub fn registry_with(
    provider: &MemoryProvider,
    settings: RoutingSettings,
    entities: Arc<dyn EntityUrlResolver>,
) -> RouteRegistry {
    RouteRegistry::new(provider, settings, entities).unwrap()
}
