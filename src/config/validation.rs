//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (overrides reference existing families,
//!   pages and entities reference existing tenants)
//! - Compile every configured rule once so broken regexes surface at load
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ConfigValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use indexmap::IndexMap;
use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::routing::error::{CompileError, ValidationError};
use crate::routing::matcher::{compile, validate_template};
use crate::routing::template::{default_routes, RouteTemplate};

#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("no tenants configured")]
    NoTenants,

    #[error("tenant {tenant} is configured more than once")]
    DuplicateTenant { tenant: u32 },

    #[error("tenant {tenant} has no locales")]
    NoLocales { tenant: u32 },

    #[error("route with empty id")]
    EmptyRouteId,

    #[error("route \"{route_id}\" does not compile: {source}")]
    InvalidRoute {
        route_id: String,
        #[source]
        source: CompileError,
    },

    #[error("override for unknown route \"{route_id}\"")]
    UnknownOverrideRoute { route_id: String },

    #[error("override for \"{route_id}\" rejected: {source}")]
    InvalidOverride {
        route_id: String,
        #[source]
        source: ValidationError,
    },

    #[error("override for \"{route_id}\" does not compile: {source}")]
    OverrideCompile {
        route_id: String,
        #[source]
        source: CompileError,
    },

    #[error("{section} entry references unknown tenant {tenant}")]
    UnknownTenant { section: &'static str, tenant: u32 },
}

/// Validate a parsed configuration, collecting every problem.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ConfigValidationError>> {
    let mut errors = Vec::new();

    if config.tenants.is_empty() {
        errors.push(ConfigValidationError::NoTenants);
    }
    let mut tenants = HashSet::new();
    for tenant in &config.tenants {
        if !tenants.insert(tenant.id) {
            errors.push(ConfigValidationError::DuplicateTenant { tenant: tenant.id });
        }
        if tenant.locales.is_empty() {
            errors.push(ConfigValidationError::NoLocales { tenant: tenant.id });
        }
    }

    let mut families: IndexMap<String, RouteTemplate> = default_routes()
        .into_iter()
        .map(|t| (t.route_id.clone(), t))
        .collect();
    for route in &config.routes {
        if route.id.trim().is_empty() {
            errors.push(ConfigValidationError::EmptyRouteId);
            continue;
        }
        let template = route.to_template();
        if let Err(source) = compile(template.clone()) {
            errors.push(ConfigValidationError::InvalidRoute {
                route_id: route.id.clone(),
                source,
            });
        }
        families.insert(route.id.clone(), template);
    }

    let templated = config.settings.templated_routing;
    for o in &config.overrides {
        let Some(family) = families.get(&o.route_id) else {
            errors.push(ConfigValidationError::UnknownOverrideRoute {
                route_id: o.route_id.clone(),
            });
            continue;
        };
        if let Err(source) = validate_template(family, &o.rule, templated) {
            errors.push(ConfigValidationError::InvalidOverride {
                route_id: o.route_id.clone(),
                source,
            });
        } else if let Err(source) = compile(family.with_pattern(o.rule.as_str())) {
            errors.push(ConfigValidationError::OverrideCompile {
                route_id: o.route_id.clone(),
                source,
            });
        }
    }

    for page in &config.pages {
        let template = RouteTemplate::new(&page.page, &page.url_rewrite, Some(page.page.as_str()));
        if let Err(source) = compile(template) {
            errors.push(ConfigValidationError::InvalidRoute {
                route_id: page.page.clone(),
                source,
            });
        }
    }

    let tenant_refs = config
        .overrides
        .iter()
        .filter_map(|o| o.tenant.map(|t| ("overrides", t)))
        .chain(config.pages.iter().filter_map(|p| p.tenant.map(|t| ("pages", t))))
        .chain(config.entities.iter().map(|e| ("entities", e.tenant)));
    for (section, tenant) in tenant_refs {
        if !tenants.contains(&tenant) {
            errors.push(ConfigValidationError::UnknownTenant { section, tenant });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
