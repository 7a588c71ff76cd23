//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::providers::EntityType;
use crate::routing::template::{KeywordSpec, RouteTemplate};

/// Root configuration for the routing engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Global routing switches.
    pub settings: RoutingSettings,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Tenants and the locales each one serves.
    pub tenants: Vec<TenantConfig>,

    /// Extension routes. An id matching a built-in family replaces it.
    pub routes: Vec<RouteConfig>,

    /// Custom rules replacing the pattern of an existing route.
    pub overrides: Vec<OverrideConfig>,

    /// Meta pages reachable through a rewritten URL.
    pub pages: Vec<PageConfig>,

    /// Entity URLs served by the bundled static entity resolver.
    pub entities: Vec<EntityConfig>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            settings: RoutingSettings::default(),
            observability: ObservabilityConfig::default(),
            tenants: vec![TenantConfig::default()],
            routes: Vec::new(),
            overrides: Vec::new(),
            pages: Vec::new(),
            entities: Vec::new(),
        }
    }
}

/// Global routing switches.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingSettings {
    /// Build and match friendly URLs from rules (URL rewriting enabled).
    pub templated_routing: bool,

    /// Leading two-letter locale segment in request paths.
    pub multi_locale: bool,

    /// Controller used for the index route.
    pub default_controller: String,

    /// Controller used for the index of a module dispatch.
    pub module_default_controller: String,

    /// Controller callers substitute when nothing matches.
    pub not_found_controller: String,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            templated_routing: true,
            multi_locale: false,
            default_controller: "index".to_string(),
            module_default_controller: "default".to_string(),
            not_found_controller: "pagenotfound".to_string(),
        }
    }
}

/// A tenant (shop) and its route table partitions.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TenantConfig {
    pub id: u32,

    /// Base URI the tenant is mounted under (e.g., "/shop/").
    pub base_uri: String,

    /// Locales with their own route bucket.
    pub locales: Vec<u32>,
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            id: 1,
            base_uri: "/".to_string(),
            locales: vec![1],
        }
    }
}

/// Keyword definition inside a route.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeywordConfig {
    /// Regex fragment captured by the placeholder.
    pub regexp: String,

    /// Output parameter; omit for cosmetic keywords.
    #[serde(default)]
    pub param: Option<String>,
}

/// Route contributed by configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    pub id: String,

    pub rule: String,

    /// Target controller; omit to take it from the bound `controller` param.
    #[serde(default)]
    pub controller: Option<String>,

    #[serde(default)]
    pub keywords: IndexMap<String, KeywordConfig>,

    /// Static params merged into every match.
    #[serde(default)]
    pub params: IndexMap<String, String>,
}

impl RouteConfig {
    pub fn to_template(&self) -> RouteTemplate {
        let mut template = RouteTemplate::new(&self.id, &self.rule, self.controller.as_deref());
        for (name, kw) in &self.keywords {
            let mut spec = KeywordSpec::new(name, &kw.regexp);
            spec.param = kw.param.clone();
            template = template.keyword(spec);
        }
        template.static_params = self.params.clone();
        template
    }
}

/// Custom rule for an existing route.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OverrideConfig {
    pub route_id: String,

    pub rule: String,

    /// Restrict to one tenant; omitted applies to all.
    #[serde(default)]
    pub tenant: Option<u32>,

    /// Restrict to one locale; omitted applies to all.
    #[serde(default)]
    pub locale: Option<u32>,
}

/// Meta page URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PageConfig {
    /// Page controller (also used as route id).
    pub page: String,

    pub url_rewrite: String,

    pub locale: u32,

    #[serde(default)]
    pub tenant: Option<u32>,
}

/// Static entity URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntityConfig {
    pub path: String,

    pub entity: EntityType,

    pub id: u64,

    pub locale: u32,

    #[serde(default = "default_tenant")]
    pub tenant: u32,

    /// Canonical URL (false = redirect alias).
    #[serde(default = "default_canonical")]
    pub canonical: bool,

    /// Controller of a generic page.
    #[serde(default)]
    pub page: Option<String>,
}

fn default_tenant() -> u32 {
    1
}

fn default_canonical() -> bool {
    true
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: RouterConfig = toml::from_str("").unwrap();
        assert!(config.settings.templated_routing);
        assert_eq!(config.tenants.len(), 1);
        assert_eq!(config.tenants[0].locales, vec![1]);
        assert_eq!(config.settings.not_found_controller, "pagenotfound");
    }

    #[test]
    fn test_route_keywords_keep_order() {
        let config: RouterConfig = toml::from_str(
            r#"
            [[routes]]
            id = "blog_post"
            rule = "blog/{id}-{rewrite}"
            controller = "post"
            params = { fc = "module", module = "blog" }

            [routes.keywords.id]
            regexp = "[0-9]+"
            param = "id_post"

            [routes.keywords.rewrite]
            regexp = "[a-z-]*"
            "#,
        )
        .unwrap();

        let template = config.routes[0].to_template();
        let names: Vec<&str> = template.keywords.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["id", "rewrite"]);
        assert!(template.find_keyword("id").unwrap().is_required());
        assert!(!template.find_keyword("rewrite").unwrap().is_required());
        assert!(template.is_module_dispatch());
    }

    #[test]
    fn test_entity_defaults() {
        let config: RouterConfig = toml::from_str(
            r#"
            [[entities]]
            path = "5-shoes"
            entity = "category"
            id = 5
            locale = 1
            "#,
        )
        .unwrap();
        let e = &config.entities[0];
        assert_eq!(e.tenant, 1);
        assert!(e.canonical);
        assert_eq!(e.entity, EntityType::Category);
    }
}
