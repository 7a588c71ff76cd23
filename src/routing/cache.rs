//! Shared compile cache.
//!
//! The same rule is compiled once per tenant and reused by every locale
//! bucket and by later reloads, as long as nothing that feeds the compiler
//! changed.

use std::sync::Arc;

use dashmap::DashMap;

use crate::routing::error::CompileError;
use crate::routing::matcher::{compile, CompiledRoute};
use crate::routing::table::TenantId;
use crate::routing::template::RouteTemplate;

/// Thread-safe cache of compiled routes keyed by tenant + template fingerprint.
#[derive(Debug, Clone, Default)]
pub struct CompileCache {
    inner: Arc<DashMap<(TenantId, String), Arc<CompiledRoute>>>,
}

impl CompileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached route for `template` or compile and remember it.
    ///
    /// Failures are not cached.
    pub fn get_or_compile(
        &self,
        tenant: TenantId,
        template: RouteTemplate,
    ) -> Result<Arc<CompiledRoute>, CompileError> {
        let key = (tenant, template.fingerprint());
        if let Some(route) = self.inner.get(&key) {
            return Ok(route.value().clone());
        }

        let route = Arc::new(compile(template)?);
        Ok(self.inner.entry(key).or_insert(route).value().clone())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drop entries no table references any more.
    pub fn prune(&self) {
        self.inner.retain(|_, route| Arc::strong_count(route) > 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::template::KeywordSpec;

    fn template(rule: &str) -> RouteTemplate {
        RouteTemplate::new("post", rule, Some("post"))
            .keyword(KeywordSpec::new("id", "[0-9]+").bound("id_post"))
    }

    #[test]
    fn test_same_template_shares_route() {
        let cache = CompileCache::new();
        let a = cache.get_or_compile(TenantId(1), template("p/{id}")).unwrap();
        let b = cache.get_or_compile(TenantId(1), template("p/{id}")).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_tenant_and_rule_partition_entries() {
        let cache = CompileCache::new();
        let a = cache.get_or_compile(TenantId(1), template("p/{id}")).unwrap();
        let b = cache.get_or_compile(TenantId(2), template("p/{id}")).unwrap();
        let c = cache.get_or_compile(TenantId(1), template("post/{id}")).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_failures_not_cached() {
        let cache = CompileCache::new();
        assert!(cache.get_or_compile(TenantId(1), template("{oops}")).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_prune_drops_unreferenced() {
        let cache = CompileCache::new();
        let kept = cache.get_or_compile(TenantId(1), template("a/{id}")).unwrap();
        drop(cache.get_or_compile(TenantId(1), template("b/{id}")).unwrap());
        cache.prune();
        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(
            &kept,
            &cache.get_or_compile(TenantId(1), template("a/{id}")).unwrap()
        ));
    }
}
