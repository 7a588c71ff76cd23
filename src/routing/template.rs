//! Route definitions.
//!
//! A `RouteTemplate` is the declarative half of a route: an id, a path rule
//! with `{keyword}` placeholders, the keyword vocabulary the rule may use and
//! the target it resolves to. Templates are plain data; `matcher.rs` turns
//! them into `CompiledRoute`s.

use indexmap::IndexMap;

use crate::providers::EntityType;

/// Ordered parameter bag (name → value).
pub type Params = IndexMap<String, String>;

/// Route id of the empty fallback route.
pub const INDEX_ROUTE: &str = "index";

/// Targets owned by the entity URL resolver. Generic template slots with these
/// targets never win a structural match.
pub const CANONICAL_TARGETS: &[&str] = &[
    "product",
    "category",
    "supplier",
    "manufacturer",
    "cms",
    "cms_category",
];

/// Capture names that are never exposed as bound parameters.
pub const INTERNAL_CAPTURES: &[&str] = &["rewrite", "cms_rewrite", "cms_cat_rewrite"];

const ID: &str = "[0-9]+";
const REWRITE: &str = r"[_a-zA-Z0-9\pL\pS-]*";
const WORD: &str = r"[_a-zA-Z0-9\pL-]*";
const SLUG: &str = "[_a-zA-Z0-9-]+";

/// A named placeholder a rule may reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSpec {
    pub name: String,
    /// Regex fragment the placeholder captures.
    pub regexp: String,
    /// Output parameter bound on match. `None` means the keyword is cosmetic.
    pub param: Option<String>,
}

impl KeywordSpec {
    pub fn new(name: impl Into<String>, regexp: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            regexp: regexp.into(),
            param: None,
        }
    }

    /// Bind the keyword to an output parameter, making it required.
    pub fn bound(mut self, param: impl Into<String>) -> Self {
        self.param = Some(param.into());
        self
    }

    pub fn is_required(&self) -> bool {
        self.param.is_some()
    }
}

/// Declarative route definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    pub route_id: String,
    pub path_pattern: String,
    /// Controller the route dispatches to; `None` takes it from the bound
    /// `controller` parameter.
    pub target: Option<String>,
    pub keywords: Vec<KeywordSpec>,
    pub static_params: Params,
}

impl RouteTemplate {
    pub fn new(
        route_id: impl Into<String>,
        path_pattern: impl Into<String>,
        target: Option<&str>,
    ) -> Self {
        Self {
            route_id: route_id.into(),
            path_pattern: path_pattern.into(),
            target: target.map(str::to_string),
            keywords: Vec::new(),
            static_params: Params::new(),
        }
    }

    pub fn keyword(mut self, spec: KeywordSpec) -> Self {
        match self.keywords.iter_mut().find(|k| k.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.keywords.push(spec),
        }
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.static_params.insert(name.into(), value.into());
        self
    }

    pub fn find_keyword(&self, name: &str) -> Option<&KeywordSpec> {
        self.keywords.iter().find(|k| k.name == name)
    }

    /// Same route with a replacement rule. Keywords and target are kept.
    pub fn with_pattern(&self, path_pattern: impl Into<String>) -> Self {
        Self {
            path_pattern: path_pattern.into(),
            ..self.clone()
        }
    }

    /// Routes flagged with both `fc` and `module` static params dispatch to a
    /// module controller and are allowed to shadow canonical targets.
    pub fn is_module_dispatch(&self) -> bool {
        self.static_params.contains_key("fc") && self.static_params.contains_key("module")
    }

    pub fn has_canonical_target(&self) -> bool {
        self.target
            .as_deref()
            .is_some_and(|t| CANONICAL_TARGETS.contains(&t))
    }

    /// Stable fingerprint of everything that affects the compiled route.
    pub fn fingerprint(&self) -> String {
        let mut sig = format!("{}|{}|", self.route_id, self.path_pattern);
        sig.push_str(self.target.as_deref().unwrap_or("-"));
        sig.push('|');
        for k in &self.keywords {
            sig.push_str(&k.name);
            sig.push('=');
            sig.push_str(&k.regexp);
            if let Some(param) = &k.param {
                sig.push('>');
                sig.push_str(param);
            }
            sig.push(';');
        }
        sig.push('|');
        for (name, value) in &self.static_params {
            sig.push_str(name);
            sig.push('=');
            sig.push_str(value);
            sig.push(';');
        }
        sig
    }
}

/// The empty fallback route. It must be tried last.
pub fn empty_route() -> RouteTemplate {
    RouteTemplate::new(INDEX_ROUTE, "", Some(INDEX_ROUTE))
}

/// Entity type whose canonical URL replaces the template of `route_id`.
pub fn canonical_entity(route_id: &str) -> Option<EntityType> {
    EntityType::CANONICAL
        .iter()
        .copied()
        .find(|e| e.route_id() == Some(route_id))
}

fn cosmetic_meta(t: RouteTemplate) -> RouteTemplate {
    t.keyword(KeywordSpec::new("meta_keywords", WORD))
        .keyword(KeywordSpec::new("meta_title", WORD))
}

fn entity_family(route_id: &str, rule: &str, target: &str, id_param: &str) -> RouteTemplate {
    cosmetic_meta(
        RouteTemplate::new(route_id, rule, Some(target))
            .keyword(KeywordSpec::new("id", ID).bound(id_param))
            .keyword(KeywordSpec::new("rewrite", REWRITE)),
    )
}

/// Built-in route families, in match-priority order.
///
/// `layered_rule` must stay after the product and category rules.
pub fn default_routes() -> Vec<RouteTemplate> {
    vec![
        entity_family("category_rule", "{id}-{rewrite}", "category", "id_category"),
        entity_family("supplier_rule", "{id}__{rewrite}", "supplier", "id_supplier"),
        entity_family(
            "manufacturer_rule",
            "{id}_{rewrite}",
            "manufacturer",
            "id_manufacturer",
        ),
        entity_family("cms_rule", "content/{id}-{rewrite}", "cms", "id_cms"),
        entity_family(
            "cms_category_rule",
            "content/category/{id}-{rewrite}",
            "cms",
            "id_cms_category",
        ),
        RouteTemplate::new("module", "module/{module}{/:controller}", None)
            .keyword(KeywordSpec::new("module", SLUG).bound("module"))
            .keyword(KeywordSpec::new("controller", SLUG).bound("controller"))
            .param("fc", "module"),
        cosmetic_meta(
            RouteTemplate::new(
                "product_rule",
                "{category:/}{id}-{rewrite}{-:ean13}.html",
                Some("product"),
            )
            .keyword(KeywordSpec::new("id", ID).bound("id_product"))
            .keyword(KeywordSpec::new("rewrite", REWRITE))
            .keyword(KeywordSpec::new("ean13", r"[0-9\pL]*"))
            .keyword(KeywordSpec::new("category", WORD))
            .keyword(KeywordSpec::new("categories", r"[/_a-zA-Z0-9\pL-]*"))
            .keyword(KeywordSpec::new("reference", WORD))
            .keyword(KeywordSpec::new("manufacturer", WORD))
            .keyword(KeywordSpec::new("supplier", WORD)),
        ),
        cosmetic_meta(
            RouteTemplate::new(
                "layered_rule",
                "{id}-{rewrite}{/:selected_filters}",
                Some("category"),
            )
            .keyword(KeywordSpec::new("id", ID).bound("id_category"))
            .keyword(KeywordSpec::new("selected_filters", ".*").bound("selected_filters"))
            .keyword(KeywordSpec::new("rewrite", REWRITE)),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layered_rule_comes_after_product_and_category() {
        let ids: Vec<String> = default_routes().into_iter().map(|r| r.route_id).collect();
        let pos = |id: &str| ids.iter().position(|r| r == id).unwrap();
        assert!(pos("layered_rule") > pos("product_rule"));
        assert!(pos("layered_rule") > pos("category_rule"));
    }

    #[test]
    fn test_keyword_replaces_same_name() {
        let t = RouteTemplate::new("r", "{id}", Some("c"))
            .keyword(KeywordSpec::new("id", "[0-9]+"))
            .keyword(KeywordSpec::new("id", "[a-z]+").bound("id_x"));
        assert_eq!(t.keywords.len(), 1);
        assert!(t.find_keyword("id").unwrap().is_required());
    }

    #[test]
    fn test_module_dispatch_needs_both_markers() {
        let module = default_routes()
            .into_iter()
            .find(|r| r.route_id == "module")
            .unwrap();
        // The built-in module route only carries `fc`.
        assert!(!module.is_module_dispatch());
        assert!(module.param("module", "blog").is_module_dispatch());
    }

    #[test]
    fn test_canonical_entity_lookup() {
        assert_eq!(canonical_entity("product_rule"), Some(EntityType::Product));
        assert_eq!(canonical_entity("cms_category_rule"), Some(EntityType::CmsCategory));
        assert_eq!(canonical_entity("layered_rule"), None);
        assert_eq!(canonical_entity("module"), None);
    }

    #[test]
    fn test_fingerprint_changes_with_binding() {
        let a = RouteTemplate::new("r", "{id}", None).keyword(KeywordSpec::new("id", ID));
        let b = RouteTemplate::new("r", "{id}", None).keyword(KeywordSpec::new("id", ID).bound("id"));
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), a.with_pattern("x/{id}").fingerprint());
    }
}
