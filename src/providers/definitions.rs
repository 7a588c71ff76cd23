//! Route definition supply.
//!
//! A `RouteDefinitionProvider` tells the registry which tenants and locales
//! exist, which route families a tenant uses, which custom rules replace their
//! patterns and which meta pages have rewritten URLs.

use indexmap::IndexMap;

use crate::config::RouterConfig;
use crate::routing::error::CollaboratorError;
use crate::routing::table::{LocaleId, Scope, TenantId};
use crate::routing::template::{default_routes, RouteTemplate};

/// A meta page reachable through a rewritten URL in one locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRoute {
    pub page: String,
    pub locale: LocaleId,
    pub url_rewrite: String,
}

impl PageRoute {
    pub fn to_template(&self) -> RouteTemplate {
        RouteTemplate::new(&self.page, &self.url_rewrite, Some(self.page.as_str()))
    }
}

/// Supplier of route definitions for the registry.
pub trait RouteDefinitionProvider: Send + Sync {
    fn tenants(&self) -> Result<Vec<TenantId>, CollaboratorError>;

    fn locales(&self, tenant: TenantId) -> Result<Vec<LocaleId>, CollaboratorError>;

    /// URI prefix the tenant is served under.
    fn base_uri(&self, _tenant: TenantId) -> Result<String, CollaboratorError> {
        Ok("/".to_string())
    }

    /// Built-in families, in match-priority order.
    fn default_routes(&self, _tenant: TenantId) -> Result<Vec<RouteTemplate>, CollaboratorError> {
        Ok(default_routes())
    }

    /// Routes contributed by extensions.
    fn extension_routes(&self, _tenant: TenantId) -> Result<Vec<RouteTemplate>, CollaboratorError> {
        Ok(Vec::new())
    }

    /// Custom rule replacing the pattern of `route_id` in `scope`.
    fn override_rule(&self, route_id: &str, scope: Scope) -> Result<Option<String>, CollaboratorError>;

    fn page_routes(&self, _tenant: TenantId) -> Result<Vec<PageRoute>, CollaboratorError> {
        Ok(Vec::new())
    }

    /// Families of a tenant: defaults with extension routes merged over them.
    ///
    /// An extension route reusing a default id replaces it at the default's
    /// position; new ids are appended.
    fn route_definitions(
        &self,
        tenant: TenantId,
    ) -> Result<IndexMap<String, RouteTemplate>, CollaboratorError> {
        let mut families: IndexMap<String, RouteTemplate> = self
            .default_routes(tenant)?
            .into_iter()
            .map(|t| (t.route_id.clone(), t))
            .collect();
        for route in self.extension_routes(tenant)? {
            families.insert(route.route_id.clone(), route);
        }
        Ok(families)
    }
}

/// Definition provider backed by a `RouterConfig`.
#[derive(Debug, Clone)]
pub struct ConfigRouteProvider {
    config: RouterConfig,
}

impl ConfigRouteProvider {
    pub fn new(config: RouterConfig) -> Self {
        Self { config }
    }

    fn applies(tenant: Option<u32>, scope_tenant: TenantId) -> bool {
        tenant.map_or(true, |t| TenantId(t) == scope_tenant)
    }
}

impl RouteDefinitionProvider for ConfigRouteProvider {
    fn tenants(&self) -> Result<Vec<TenantId>, CollaboratorError> {
        Ok(self.config.tenants.iter().map(|t| TenantId(t.id)).collect())
    }

    fn locales(&self, tenant: TenantId) -> Result<Vec<LocaleId>, CollaboratorError> {
        self.config
            .tenants
            .iter()
            .find(|t| TenantId(t.id) == tenant)
            .map(|t| t.locales.iter().copied().map(LocaleId).collect())
            .ok_or_else(|| CollaboratorError::new("route definitions", format!("unknown tenant {tenant}")))
    }

    fn base_uri(&self, tenant: TenantId) -> Result<String, CollaboratorError> {
        Ok(self
            .config
            .tenants
            .iter()
            .find(|t| TenantId(t.id) == tenant)
            .map_or_else(|| "/".to_string(), |t| t.base_uri.clone()))
    }

    fn extension_routes(&self, _tenant: TenantId) -> Result<Vec<RouteTemplate>, CollaboratorError> {
        Ok(self.config.routes.iter().map(|r| r.to_template()).collect())
    }

    /// Locale-specific overrides win over tenant-wide ones.
    fn override_rule(&self, route_id: &str, scope: Scope) -> Result<Option<String>, CollaboratorError> {
        let candidates = self
            .config
            .overrides
            .iter()
            .filter(|o| o.route_id == route_id && Self::applies(o.tenant, scope.tenant));
        let mut fallback = None;
        for o in candidates {
            match o.locale {
                Some(locale) if LocaleId(locale) == scope.locale => return Ok(Some(o.rule.clone())),
                Some(_) => {}
                None => fallback = fallback.or(Some(o.rule.clone())),
            }
        }
        Ok(fallback)
    }

    fn page_routes(&self, tenant: TenantId) -> Result<Vec<PageRoute>, CollaboratorError> {
        Ok(self
            .config
            .pages
            .iter()
            .filter(|p| Self::applies(p.tenant, tenant))
            .map(|p| PageRoute {
                page: p.page.clone(),
                locale: LocaleId(p.locale),
                url_rewrite: p.url_rewrite.clone(),
            })
            .collect())
    }
}
