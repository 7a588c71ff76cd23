//! Tenant/locale partitioned route storage.
//!
//! # Responsibilities
//! - Hold compiled routes per (tenant, locale) bucket, keyed by route id
//! - Preserve insertion order as match priority
//! - Keep the route families each tenant was built from (for validation)
//!
//! # Design Decisions
//! - Re-adding an existing id replaces it in place; `push_last` moves it
//! - Empty-rule routes are always yielded after every other route, whatever
//!   their insertion position
//! - Routes are `Arc`-shared; nothing here mutates a compiled route

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::routing::error::CompileError;
use crate::routing::matcher::{compile, mentions_keyword, CompiledRoute};
use crate::routing::template::RouteTemplate;

/// Tenant (shop) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub u32);

/// Locale (language) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocaleId(pub u32);

impl From<u32> for TenantId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<u32> for LocaleId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LocaleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The (tenant, locale) pair a route table bucket belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Scope {
    pub tenant: TenantId,
    pub locale: LocaleId,
}

impl Scope {
    pub fn new(tenant: u32, locale: u32) -> Self {
        Self {
            tenant: TenantId(tenant),
            locale: LocaleId(locale),
        }
    }
}

type Bucket = IndexMap<String, Arc<CompiledRoute>>;

/// Ordered, partitioned collection of compiled routes.
#[derive(Debug, Default)]
pub struct RouteTable {
    buckets: HashMap<Scope, Bucket>,
    families: HashMap<TenantId, IndexMap<String, RouteTemplate>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `template` and insert it into the scope's bucket.
    pub fn add_route(&mut self, scope: Scope, template: RouteTemplate) -> Result<(), CompileError> {
        let route = compile(template)?;
        self.insert(scope, Arc::new(route));
        Ok(())
    }

    /// Insert a compiled route. An existing id keeps its position.
    pub fn insert(&mut self, scope: Scope, route: Arc<CompiledRoute>) {
        self.buckets
            .entry(scope)
            .or_default()
            .insert(route.route_id().to_string(), route);
    }

    /// Insert a compiled route at the end of the bucket, moving an existing id.
    pub fn push_last(&mut self, scope: Scope, route: Arc<CompiledRoute>) {
        let bucket = self.buckets.entry(scope).or_default();
        bucket.shift_remove(route.route_id());
        bucket.insert(route.route_id().to_string(), route);
    }

    pub fn get(&self, scope: Scope, route_id: &str) -> Option<&Arc<CompiledRoute>> {
        self.buckets.get(&scope)?.get(route_id)
    }

    pub fn has_route(&self, scope: Scope, route_id: &str) -> bool {
        self.get(scope, route_id).is_some()
    }

    /// True if the route's current rule still has a placeholder for `keyword`.
    pub fn has_keyword(&self, scope: Scope, route_id: &str, keyword: &str) -> bool {
        self.get(scope, route_id)
            .is_some_and(|r| mentions_keyword(&r.template().path_pattern, keyword))
    }

    /// Routes of a bucket in match order: insertion order, empty rules last.
    pub fn routes(&self, scope: Scope) -> Vec<&Arc<CompiledRoute>> {
        let Some(bucket) = self.buckets.get(&scope) else {
            return Vec::new();
        };
        let (fallback, mut ordered): (Vec<_>, Vec<_>) =
            bucket.values().partition(|r| r.is_empty_rule());
        ordered.extend(fallback);
        ordered
    }

    pub fn set_families(&mut self, tenant: TenantId, families: IndexMap<String, RouteTemplate>) {
        self.families.insert(tenant, families);
    }

    /// Default definition of a route family for a tenant.
    pub fn family(&self, tenant: TenantId, route_id: &str) -> Option<&RouteTemplate> {
        self.families.get(&tenant)?.get(route_id)
    }

    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.buckets.keys()
    }

    pub fn route_count(&self) -> usize {
        self.buckets.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.route_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::template::{empty_route, KeywordSpec};

    fn scope() -> Scope {
        Scope::new(1, 1)
    }

    fn route(id: &str, rule: &str) -> RouteTemplate {
        RouteTemplate::new(id, rule, Some(id))
    }

    fn ids(table: &RouteTable, scope: Scope) -> Vec<String> {
        table
            .routes(scope)
            .into_iter()
            .map(|r| r.route_id().to_string())
            .collect()
    }

    #[test]
    fn test_override_keeps_position() {
        let mut table = RouteTable::new();
        table.add_route(scope(), route("a", "a")).unwrap();
        table.add_route(scope(), route("b", "b")).unwrap();
        table.add_route(scope(), route("a", "alpha")).unwrap();

        assert_eq!(ids(&table, scope()), vec!["a", "b"]);
        assert_eq!(table.get(scope(), "a").unwrap().template().path_pattern, "alpha");
    }

    #[test]
    fn test_push_last_moves_route() {
        let mut table = RouteTable::new();
        table.add_route(scope(), route("a", "a")).unwrap();
        table.add_route(scope(), route("b", "b")).unwrap();
        let again = Arc::new(compile(route("a", "a")).unwrap());
        table.push_last(scope(), again);

        assert_eq!(ids(&table, scope()), vec!["b", "a"]);
    }

    #[test]
    fn test_empty_rule_yielded_last() {
        let mut table = RouteTable::new();
        table.add_route(scope(), empty_route()).unwrap();
        table.add_route(scope(), route("a", "a")).unwrap();
        table.add_route(scope(), route("b", "b")).unwrap();

        assert_eq!(ids(&table, scope()), vec!["a", "b", "index"]);
    }

    #[test]
    fn test_buckets_are_isolated() {
        let mut table = RouteTable::new();
        table.add_route(Scope::new(1, 1), route("a", "a")).unwrap();
        table.add_route(Scope::new(1, 2), route("b", "b")).unwrap();
        table.add_route(Scope::new(2, 1), route("c", "c")).unwrap();

        assert!(table.has_route(Scope::new(1, 1), "a"));
        assert!(!table.has_route(Scope::new(1, 2), "a"));
        assert!(!table.has_route(Scope::new(2, 1), "a"));
        assert!(table.routes(Scope::new(9, 9)).is_empty());
        assert_eq!(table.route_count(), 3);
    }

    #[test]
    fn test_has_keyword_reads_current_rule() {
        let mut table = RouteTable::new();
        let template = RouteTemplate::new("p", "{id}{-:ean13}", Some("p"))
            .keyword(KeywordSpec::new("id", "[0-9]+").bound("id_p"))
            .keyword(KeywordSpec::new("ean13", "[0-9]*"));
        table.add_route(scope(), template.clone()).unwrap();
        assert!(table.has_keyword(scope(), "p", "ean13"));

        table.add_route(scope(), template.with_pattern("{id}")).unwrap();
        assert!(!table.has_keyword(scope(), "p", "ean13"));
        assert!(!table.has_keyword(scope(), "missing", "id"));
    }

    #[test]
    fn test_rejected_template_leaves_table_untouched() {
        let mut table = RouteTable::new();
        assert!(table.add_route(scope(), route("bad", "{nope}")).is_err());
        assert!(table.is_empty());
    }
}
