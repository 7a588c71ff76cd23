//! Entity URL resolution.
//!
//! The content store owns the canonical URL of products, categories and the
//! like. The router asks it first on every request and defers to it when
//! building URLs for canonical routes.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::schema::EntityConfig;
use crate::routing::error::CollaboratorError;
use crate::routing::table::Scope;

/// Kind of entity a friendly URL can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Product,
    Category,
    Supplier,
    Manufacturer,
    CmsPage,
    CmsCategory,
    GenericPage,
}

impl EntityType {
    /// Entity types that own a canonical route family.
    pub const CANONICAL: [EntityType; 6] = [
        EntityType::Product,
        EntityType::Category,
        EntityType::Supplier,
        EntityType::Manufacturer,
        EntityType::CmsPage,
        EntityType::CmsCategory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Product => "product",
            EntityType::Category => "category",
            EntityType::Supplier => "supplier",
            EntityType::Manufacturer => "manufacturer",
            EntityType::CmsPage => "cms_page",
            EntityType::CmsCategory => "cms_category",
            EntityType::GenericPage => "generic_page",
        }
    }

    /// Route family whose URL this entity type owns.
    pub fn route_id(&self) -> Option<&'static str> {
        match self {
            EntityType::Product => Some("product_rule"),
            EntityType::Category => Some("category_rule"),
            EntityType::Supplier => Some("supplier_rule"),
            EntityType::Manufacturer => Some("manufacturer_rule"),
            EntityType::CmsPage => Some("cms_rule"),
            EntityType::CmsCategory => Some("cms_category_rule"),
            EntityType::GenericPage => None,
        }
    }

    pub fn controller(&self) -> Option<&'static str> {
        match self {
            EntityType::Product => Some("product"),
            EntityType::Category => Some("category"),
            EntityType::Supplier => Some("supplier"),
            EntityType::Manufacturer => Some("manufacturer"),
            EntityType::CmsPage | EntityType::CmsCategory => Some("cms"),
            EntityType::GenericPage => None,
        }
    }

    /// Parameter the entity id is bound to.
    pub fn id_param(&self) -> &'static str {
        match self {
            EntityType::Product => "id_product",
            EntityType::Category => "id_category",
            EntityType::Supplier => "id_supplier",
            EntityType::Manufacturer => "id_manufacturer",
            EntityType::CmsPage => "id_cms",
            EntityType::CmsCategory => "id_cms_category",
            EntityType::GenericPage => "id_meta",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entity recognised from a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityRef {
    pub entity: EntityType,
    pub id: u64,
}

/// Which stored URL to return on reverse lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlVariant {
    Canonical,
    /// A historical URL kept for redirects.
    Redirect,
}

/// Content-store lookup of entity URLs.
///
/// Paths are passed without a leading slash.
pub trait EntityUrlResolver: Send + Sync {
    fn lookup(&self, path: &str, scope: Scope) -> Result<Option<EntityRef>, CollaboratorError>;

    fn reverse_lookup(
        &self,
        id: &str,
        entity: EntityType,
        scope: Scope,
        variant: UrlVariant,
    ) -> Result<Option<String>, CollaboratorError>;

    /// Controller name of a generic page.
    fn page_controller(&self, _page_id: u64, _scope: Scope) -> Result<Option<String>, CollaboratorError> {
        Ok(None)
    }
}

/// One stored entity URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    pub scope: Scope,
    pub path: String,
    pub entity: EntityType,
    pub id: u64,
    pub canonical: bool,
    /// Controller of a generic page.
    pub page: Option<String>,
}

impl From<&EntityConfig> for EntityRecord {
    fn from(config: &EntityConfig) -> Self {
        Self {
            scope: Scope::new(config.tenant, config.locale),
            path: config.path.clone(),
            entity: config.entity,
            id: config.id,
            canonical: config.canonical,
            page: config.page.clone(),
        }
    }
}

/// In-memory entity resolver backed by a fixed URL list.
#[derive(Debug, Clone, Default)]
pub struct StaticEntityResolver {
    by_path: HashMap<(Scope, String), EntityRef>,
    records: Vec<EntityRecord>,
}

impl StaticEntityResolver {
    pub fn new(records: Vec<EntityRecord>) -> Self {
        let mut by_path = HashMap::new();
        for r in &records {
            let path = r.path.trim_matches('/').to_string();
            by_path.entry((r.scope, path)).or_insert(EntityRef {
                entity: r.entity,
                id: r.id,
            });
        }
        Self { by_path, records }
    }

    pub fn from_config(entities: &[EntityConfig]) -> Self {
        Self::new(entities.iter().map(EntityRecord::from).collect())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl EntityUrlResolver for StaticEntityResolver {
    fn lookup(&self, path: &str, scope: Scope) -> Result<Option<EntityRef>, CollaboratorError> {
        Ok(self
            .by_path
            .get(&(scope, path.trim_matches('/').to_string()))
            .copied())
    }

    fn reverse_lookup(
        &self,
        id: &str,
        entity: EntityType,
        scope: Scope,
        variant: UrlVariant,
    ) -> Result<Option<String>, CollaboratorError> {
        let Ok(id) = id.parse::<u64>() else {
            return Ok(None);
        };
        let want_canonical = variant == UrlVariant::Canonical;
        Ok(self
            .records
            .iter()
            .find(|r| {
                r.scope == scope && r.entity == entity && r.id == id && r.canonical == want_canonical
            })
            .map(|r| r.path.trim_matches('/').to_string()))
    }

    fn page_controller(&self, page_id: u64, scope: Scope) -> Result<Option<String>, CollaboratorError> {
        Ok(self
            .records
            .iter()
            .find(|r| r.scope == scope && r.entity == EntityType::GenericPage && r.id == page_id)
            .and_then(|r| r.page.clone()))
    }
}
