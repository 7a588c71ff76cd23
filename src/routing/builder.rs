//! Reverse URL building: route id + parameters → path.
//!
//! # Responsibilities
//! - Templated form: substitute placeholders, drop empty affix groups,
//!   append leftover params as a query string
//! - Query form: `index.php?controller=...` with bound parameter names
//! - Canonical entity routes: delegate to the entity URL resolver
//! - Unknown route ids: synthesize a minimal query URL
//!
//! # Design Decisions
//! - Required keywords are checked before any output is produced
//! - Query strings keep parameter insertion order

use url::form_urlencoded;

use crate::observability::metrics;
use crate::providers::{EntityUrlResolver, UrlVariant};
use crate::routing::error::{RouteError, RouteResult};
use crate::routing::matcher::{CompiledRoute, Segment};
use crate::routing::table::{RouteTable, Scope};
use crate::routing::template::{canonical_entity, Params, INDEX_ROUTE};

const FRONT_SCRIPT: &str = "index.php";

/// Options of one `build` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions<'a> {
    /// Friendly URL instead of a query-string URL.
    pub templated: bool,
    /// Emit `id_lang` in query-string URLs.
    pub multi_locale: bool,
    /// Fragment appended verbatim (e.g. `#reviews`).
    pub anchor: &'a str,
}

fn query_string<'p>(pairs: impl IntoIterator<Item = (&'p String, &'p String)>) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

fn with_query(base: &str, query: &str) -> String {
    if query.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{query}")
    }
}

/// Builds URLs from one route table snapshot.
pub struct ReverseBuilder<'a> {
    table: &'a RouteTable,
    entities: &'a dyn EntityUrlResolver,
}

impl<'a> ReverseBuilder<'a> {
    pub fn new(table: &'a RouteTable, entities: &'a dyn EntityUrlResolver) -> Self {
        Self { table, entities }
    }

    pub fn build(
        &self,
        scope: Scope,
        route_id: &str,
        params: &Params,
        options: BuildOptions<'_>,
    ) -> RouteResult<String> {
        let Some(route) = self.table.get(scope, route_id) else {
            metrics::record_build("fallback");
            tracing::debug!(route_id, tenant = %scope.tenant, "Route not in table, building fallback url");
            return Ok(format!("{}{}", fallback_url(route_id, params, options.templated), options.anchor));
        };

        let canonical = canonical_entity(route_id).filter(|_| options.templated);
        if canonical.is_none() {
            check_required(route, params)?;
        }

        let url = match canonical {
            Some(entity) => {
                let id = params.get("id").ok_or_else(|| RouteError::MissingParameter {
                    route_id: route_id.to_string(),
                    keyword: "id".to_string(),
                })?;
                metrics::record_build("canonical");
                self.entities
                    .reverse_lookup(id, entity, scope, UrlVariant::Canonical)?
                    .ok_or_else(|| RouteError::UnknownEntity {
                        entity: entity.to_string(),
                        id: id.clone(),
                    })?
            }
            None if options.templated => {
                metrics::record_build("templated");
                templated_url(route, params)
            }
            None => {
                metrics::record_build("query");
                query_url(route, scope, params, options.multi_locale)
            }
        };

        Ok(format!("{}{}", url, options.anchor))
    }
}

fn check_required(route: &CompiledRoute, params: &Params) -> RouteResult<()> {
    match route
        .placeholders()
        .find(|p| p.required && !params.contains_key(&p.keyword))
    {
        Some(missing) => Err(RouteError::MissingParameter {
            route_id: route.route_id().to_string(),
            keyword: missing.keyword.clone(),
        }),
        None => Ok(()),
    }
}

fn templated_url(route: &CompiledRoute, params: &Params) -> String {
    let mut url = String::new();
    for segment in route.segments() {
        match segment {
            Segment::Literal(text) => url.push_str(text),
            Segment::Placeholder(p) => {
                if let Some(value) = params.get(&p.keyword).filter(|v| !v.is_empty()) {
                    url.push_str(&p.prepend);
                    url.push_str(value);
                    url.push_str(&p.append);
                }
            }
        }
    }

    // Keyword params are either substituted above or dropped.
    let template = route.template();
    let extra = params.iter().filter(|(k, _)| template.find_keyword(k).is_none());
    with_query(&url, &query_string(extra))
}

fn query_url(route: &CompiledRoute, scope: Scope, params: &Params, multi_locale: bool) -> String {
    let template = route.template();

    let mut query: Params = params
        .iter()
        .filter(|(k, _)| template.find_keyword(k).is_none())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    for (k, v) in &template.static_params {
        query.insert(k.clone(), v.clone());
    }
    for keyword in &template.keywords {
        if let (Some(param), Some(value)) = (&keyword.param, params.get(&keyword.name)) {
            query.insert(param.clone(), value.clone());
        }
    }
    if let Some(target) = template.target.as_deref().filter(|t| !t.is_empty()) {
        query.insert("controller".to_string(), target.to_string());
    }
    if multi_locale {
        query.insert("id_lang".to_string(), scope.locale.to_string());
    }

    with_query(FRONT_SCRIPT, &query_string(&query))
}

/// URL for a route id the table does not know.
fn fallback_url(route_id: &str, params: &Params, templated: bool) -> String {
    let route_id = route_id.trim();
    if route_id.is_empty() || route_id == INDEX_ROUTE {
        let index_link = if templated { "" } else { FRONT_SCRIPT };
        return with_query(index_link, &query_string(params));
    }

    let mut query = Params::new();
    query.insert("controller".to_string(), route_id.to_string());
    for (k, v) in params {
        query.insert(k.clone(), v.clone());
    }
    with_query(FRONT_SCRIPT, &query_string(&query))
}
