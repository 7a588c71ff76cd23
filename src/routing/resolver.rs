//! Forward resolution: request path → route + bound parameters.
//!
//! # Responsibilities
//! - Normalize the raw request path (query, percent-encoding, base URI,
//!   locale segment, trailing slash)
//! - Honor an explicit `controller` query parameter
//! - Ask the entity URL resolver before any template
//! - Scan the scope's routes in insertion order, empty rule last
//!
//! # Design Decisions
//! - First structural match wins; ordering is the caller's responsibility
//! - Generic slots with canonical targets never match unless flagged as
//!   module dispatch
//! - No match is `Resolution::NotFound`, collaborator failures are errors

use percent_encoding::percent_decode_str;
use serde::Serialize;
use url::form_urlencoded;

use crate::config::RoutingSettings;
use crate::observability::metrics;
use crate::providers::EntityUrlResolver;
use crate::routing::error::RouteResult;
use crate::routing::table::{RouteTable, Scope};
use crate::routing::template::{Params, INDEX_ROUTE, INTERNAL_CAPTURES};

/// Everything the resolver needs to know about one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Raw request URI (path and optional query).
    pub path: String,
    pub scope: Scope,
    pub templated_routing: bool,
    pub multi_locale: bool,
    /// Base URI of the tenant, replaced by `/` before matching.
    pub base_uri: String,
}

/// How a match was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    /// `controller` query parameter.
    Explicit,
    /// Entity URL resolver.
    Entity,
    /// Route template.
    Route,
    /// Index / default controller.
    Default,
}

/// A resolved request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMatch {
    pub route_id: String,
    pub controller: String,
    pub params: Params,
    /// The controller lives in a module (`fc=module`).
    pub module_dispatch: bool,
    /// Locale segment stripped from the path.
    pub locale_code: Option<String>,
    pub source: MatchSource,
}

/// Outcome of `resolve`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    Matched(RouteMatch),
    NotFound,
}

impl Resolution {
    pub fn matched(&self) -> Option<&RouteMatch> {
        match self {
            Resolution::Matched(m) => Some(m),
            Resolution::NotFound => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Resolution::NotFound)
    }
}

/// Request path after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPath {
    /// Leading slash, no trailing slash; empty for the root.
    pub path: String,
    pub locale_code: Option<String>,
    /// The request addressed the front script directly.
    pub index_script: bool,
}

/// Normalize a raw request URI for matching.
pub fn normalize(raw: &str, base_uri: &str, strip_locale: bool) -> NormalizedPath {
    let raw_path = raw.split_once('?').map_or(raw, |(path, _)| path);
    let decoded = percent_decode_str(raw_path).decode_utf8_lossy();

    let under_base = !base_uri.is_empty()
        && decoded
            .get(..base_uri.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(base_uri));
    let mut path = if under_base {
        format!("/{}", &decoded[base_uri.len()..])
    } else {
        decoded.into_owned()
    };
    if !path.starts_with('/') {
        path.insert(0, '/');
    }

    let locale_code = if strip_locale {
        crate::regex!(r"^/([a-z]{2})(?:/.*)?$")
            .captures(&path)
            .map(|caps| caps[1].to_string())
    } else {
        None
    };
    if locale_code.is_some() {
        path = path[3..].to_string();
    }

    let index_script = path == "/index.php";
    let path = path.trim_end_matches('/').to_string();

    NormalizedPath {
        path,
        locale_code,
        index_script,
    }
}

fn is_static_asset(path: &str) -> bool {
    crate::regex!(r"(?i)\.(gif|jpe?g|png|css|js|ico)$").is_match(path)
}

/// `controller` query parameter, including the legacy `name?key=value` form.
fn explicit_controller(query: &str) -> Option<(String, Params)> {
    let value = form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == "controller")
        .map(|(_, v)| v.into_owned())?;

    let legacy = crate::regex!(r"(?i)^([0-9a-z_-]+)\?(.*?)=(.*)$")
        .captures(&value)
        .map(|caps| (caps[1].to_string(), caps[2].to_string(), caps[3].to_string()));

    let mut params = Params::new();
    let name = match legacy {
        Some((name, key, val)) => {
            params.insert(key, val);
            name
        }
        None => value,
    };

    crate::regex!(r"^[0-9A-Za-z_-]+$")
        .is_match(&name)
        .then_some((name, params))
}

/// Split `module-<module>-<controller>` into its parts.
fn split_module_controller(controller: &str) -> Option<(String, String)> {
    crate::regex!(r"(?i)module-([a-z0-9_-]+)-([a-z0-9_]+)$")
        .captures(controller)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
}

fn controller_name(controller: &str) -> String {
    controller.replace('-', "")
}

/// Resolves requests against one route table snapshot.
pub struct Resolver<'a> {
    table: &'a RouteTable,
    entities: &'a dyn EntityUrlResolver,
    settings: &'a RoutingSettings,
}

impl<'a> Resolver<'a> {
    pub fn new(
        table: &'a RouteTable,
        entities: &'a dyn EntityUrlResolver,
        settings: &'a RoutingSettings,
    ) -> Self {
        Self {
            table,
            entities,
            settings,
        }
    }

    pub fn resolve(&self, ctx: &RequestContext) -> RouteResult<Resolution> {
        let resolution = self.resolve_inner(ctx);
        let outcome = match &resolution {
            Ok(Resolution::Matched(m)) => match m.source {
                MatchSource::Explicit => "explicit",
                MatchSource::Entity => "entity",
                MatchSource::Route => "route",
                MatchSource::Default => "default",
            },
            Ok(Resolution::NotFound) => "not_found",
            Err(_) => "error",
        };
        metrics::record_resolution(outcome);

        match &resolution {
            Ok(Resolution::Matched(m)) => tracing::debug!(
                path = %ctx.path,
                tenant = %ctx.scope.tenant,
                locale = %ctx.scope.locale,
                route_id = %m.route_id,
                controller = %m.controller,
                outcome,
                "Request resolved"
            ),
            Ok(Resolution::NotFound) => {
                tracing::debug!(path = %ctx.path, tenant = %ctx.scope.tenant, "No route matched")
            }
            Err(e) => tracing::warn!(path = %ctx.path, error = %e, "Route resolution failed"),
        }
        resolution
    }

    fn resolve_inner(&self, ctx: &RequestContext) -> RouteResult<Resolution> {
        let query = ctx.path.split_once('?').map(|(_, q)| q);
        if let Some((controller, params)) = query.and_then(explicit_controller) {
            let module_dispatch = query
                .map(|q| form_urlencoded::parse(q.as_bytes()).any(|(k, v)| k == "fc" && v == "module"))
                .unwrap_or(false);
            return Ok(Resolution::Matched(RouteMatch {
                route_id: controller.clone(),
                controller: controller_name(&controller),
                params,
                module_dispatch,
                locale_code: None,
                source: MatchSource::Explicit,
            }));
        }

        if !ctx.templated_routing {
            return Ok(Resolution::Matched(self.index_match(None)));
        }

        let normalized = normalize(&ctx.path, &ctx.base_uri, ctx.multi_locale);
        if is_static_asset(&normalized.path) {
            return Ok(Resolution::NotFound);
        }
        if normalized.path.is_empty() || normalized.index_script {
            return Ok(Resolution::Matched(self.index_match(normalized.locale_code)));
        }

        if let Some(m) = self.lookup_entity(&normalized, ctx.scope)? {
            return Ok(Resolution::Matched(m));
        }

        Ok(match self.scan(&normalized, ctx.scope) {
            Some(m) => Resolution::Matched(m),
            None => Resolution::NotFound,
        })
    }

    fn default_controller(&self, module_dispatch: bool) -> String {
        if module_dispatch {
            self.settings.module_default_controller.clone()
        } else {
            self.settings.default_controller.clone()
        }
    }

    fn index_match(&self, locale_code: Option<String>) -> RouteMatch {
        RouteMatch {
            route_id: INDEX_ROUTE.to_string(),
            controller: controller_name(&self.default_controller(false)),
            params: Params::new(),
            module_dispatch: false,
            locale_code,
            source: MatchSource::Default,
        }
    }

    fn lookup_entity(&self, normalized: &NormalizedPath, scope: Scope) -> RouteResult<Option<RouteMatch>> {
        let rewrite = normalized.path.trim_start_matches('/');
        if rewrite.is_empty() {
            return Ok(None);
        }
        let Some(hit) = self.entities.lookup(rewrite, scope)? else {
            return Ok(None);
        };

        let (route_id, controller) = match (hit.entity.route_id(), hit.entity.controller()) {
            (Some(route_id), Some(controller)) => (route_id.to_string(), controller.to_string()),
            _ => match self.entities.page_controller(hit.id, scope)? {
                Some(page) => (page.clone(), page),
                None => return Ok(None),
            },
        };

        let mut params = Params::new();
        params.insert(hit.entity.id_param().to_string(), hit.id.to_string());
        Ok(Some(RouteMatch {
            route_id,
            controller: controller_name(&controller),
            params,
            module_dispatch: false,
            locale_code: normalized.locale_code.clone(),
            source: MatchSource::Entity,
        }))
    }

    fn scan(&self, normalized: &NormalizedPath, scope: Scope) -> Option<RouteMatch> {
        for route in self.table.routes(scope) {
            let template = route.template();
            if template.has_canonical_target() && !template.is_module_dispatch() {
                continue;
            }
            let Some(captures) = route.captures(&normalized.path) else {
                continue;
            };

            let mut params: Params = captures
                .into_iter()
                .filter(|(name, _)| !INTERNAL_CAPTURES.contains(&name.as_str()))
                .collect();
            let mut controller = template
                .target
                .clone()
                .or_else(|| params.get("controller").cloned());
            for (name, value) in &template.static_params {
                params.insert(name.clone(), value.clone());
            }

            if let Some((module, module_controller)) =
                controller.as_deref().and_then(split_module_controller)
            {
                params.insert("module".to_string(), module);
                params.insert("fc".to_string(), "module".to_string());
                controller = Some(module_controller);
            }

            let module_dispatch = params.get("fc").is_some_and(|fc| fc == "module");
            let controller = match controller {
                Some(c) if !c.is_empty() && c != INDEX_ROUTE => c,
                _ => self.default_controller(module_dispatch),
            };

            return Some(RouteMatch {
                route_id: route.route_id().to_string(),
                controller: controller_name(&controller),
                params,
                module_dispatch,
                locale_code: normalized.locale_code.clone(),
                source: MatchSource::Route,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_decodes() {
        let n = normalize("/caf%C3%A9/?utm=1", "/", false);
        assert_eq!(n.path, "/café");
        assert_eq!(n.locale_code, None);
        assert!(!n.index_script);

        assert_eq!(normalize("/", "/", false).path, "");
        assert_eq!(normalize("5-shoes.html", "/", false).path, "/5-shoes.html");
    }

    #[test]
    fn test_normalize_strips_base_uri_case_insensitively() {
        assert_eq!(normalize("/Shop/5-shoes", "/shop/", false).path, "/5-shoes");
        assert_eq!(normalize("/other/5-shoes", "/shop/", false).path, "/other/5-shoes");
    }

    #[test]
    fn test_normalize_locale_segment() {
        let n = normalize("/en/5-shoes", "/", true);
        assert_eq!(n.path, "/5-shoes");
        assert_eq!(n.locale_code.as_deref(), Some("en"));

        let root = normalize("/de", "/", true);
        assert_eq!(root.path, "");
        assert_eq!(root.locale_code.as_deref(), Some("de"));

        // Three letters is not a locale; disabled stripping leaves it alone.
        assert_eq!(normalize("/eng/x", "/", true).locale_code, None);
        assert_eq!(normalize("/en/x", "/", false).path, "/en/x");
    }

    #[test]
    fn test_normalize_index_script() {
        assert!(normalize("/index.php?foo=bar", "/", false).index_script);
        assert!(!normalize("/index.php/x", "/", false).index_script);
    }

    #[test]
    fn test_static_assets() {
        assert!(is_static_asset("/img/logo.PNG"));
        assert!(is_static_asset("/theme.css"));
        assert!(!is_static_asset("/5-shoes.html"));
    }

    #[test]
    fn test_explicit_controller() {
        let (name, params) = explicit_controller("controller=cart&x=1").unwrap();
        assert_eq!(name, "cart");
        assert!(params.is_empty());

        let (name, params) = explicit_controller("controller=order%3Fstep%3D2").unwrap();
        assert_eq!(name, "order");
        assert_eq!(params.get("step").map(String::as_str), Some("2"));

        let (name, params) = explicit_controller("controller=order%3Fstep%3D2%3D3").unwrap();
        assert_eq!(name, "order");
        assert_eq!(params.get("step").map(String::as_str), Some("2=3"));

        assert!(explicit_controller("controller=../etc").is_none());
        assert!(explicit_controller("id=3").is_none());
    }

    #[test]
    fn test_split_module_controller() {
        assert_eq!(
            split_module_controller("module-blog-post"),
            Some(("blog".to_string(), "post".to_string()))
        );
        assert_eq!(split_module_controller("product"), None);
    }
}
