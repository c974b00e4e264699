//! Catalog content queries
//!
//! Services, products and projects share one listing routine, parameterized
//! by [`CatalogKind`]: read the active entries in display order, and fall back
//! to the built-in dataset when the store has none or cannot be reached. The
//! listing reports which of those happened in its `source` field.

use bson::{doc, DateTime, Document};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::db::schemas::{
    Feature, ProductDoc, ProjectDoc, ServiceDoc, PRODUCT_COLLECTION, PROJECT_COLLECTION,
    SERVICE_COLLECTION,
};
use crate::db::{DocumentStore, FindSpec};
use crate::services::defaults;
use crate::types::{Clock, Result};
use crate::validation::{ProductPayload, ProjectPayload, ServicePayload, Validate};

/// One kind of catalog entry
pub trait CatalogKind {
    /// Stored form
    type Doc: Serialize + DeserializeOwned + Send;
    /// Form returned by the API
    type View: Serialize + From<Self::Doc> + Send;

    const COLLECTION: &'static str;

    /// Plural name, also the JSON key of listings
    const LABEL: &'static str;

    /// Display order
    fn sort() -> Document;

    /// Built-in entries
    fn defaults() -> Vec<Self::Doc>;
}

/// Where a listing's items came from
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentSource {
    /// Active entries read from the store
    Store,
    /// Store has no active entries
    Default,
    /// Store query failed
    Degraded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogListing<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub source: ContentSource,
}

impl<T> CatalogListing<T> {
    fn new(items: Vec<T>, source: ContentSource) -> Self {
        Self {
            total: items.len(),
            items,
            source,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Service {
    pub id: String,
    pub icon: String,
    pub title: String,
    pub description: String,
    pub features: Vec<String>,
    pub is_active: bool,
    pub order: i32,
}

impl From<ServiceDoc> for Service {
    fn from(doc: ServiceDoc) -> Self {
        Self {
            id: doc._id,
            icon: doc.icon,
            title: doc.title,
            description: doc.description,
            features: doc.features,
            is_active: doc.is_active,
            order: doc.order,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Product {
    pub id: String,
    pub icon: String,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub features: Vec<Feature>,
    pub color: String,
    pub is_active: bool,
    pub order: i32,
}

impl From<ProductDoc> for Product {
    fn from(doc: ProductDoc) -> Self {
        Self {
            id: doc._id,
            icon: doc.icon,
            title: doc.title,
            subtitle: doc.subtitle,
            description: doc.description,
            features: doc.features,
            color: doc.color,
            is_active: doc.is_active,
            order: doc.order,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub client: String,
    pub category: String,
    pub description: String,
    pub features: Vec<String>,
    pub technologies: Vec<String>,
    pub duration: String,
    pub year: String,
    pub status: String,
    pub icon: String,
    pub is_active: bool,
    pub order: i32,
}

impl From<ProjectDoc> for Project {
    fn from(doc: ProjectDoc) -> Self {
        Self {
            id: doc._id,
            title: doc.title,
            client: doc.client,
            category: doc.category,
            description: doc.description,
            features: doc.features,
            technologies: doc.technologies,
            duration: doc.duration,
            year: doc.year,
            status: doc.status,
            icon: doc.icon,
            is_active: doc.is_active,
            order: doc.order,
        }
    }
}

pub struct Services;
pub struct Products;
pub struct Projects;

impl CatalogKind for Services {
    type Doc = ServiceDoc;
    type View = Service;
    const COLLECTION: &'static str = SERVICE_COLLECTION;
    const LABEL: &'static str = "services";

    fn sort() -> Document {
        doc! { "order": 1, "created_at": 1 }
    }

    fn defaults() -> Vec<ServiceDoc> {
        defaults::services()
    }
}

impl CatalogKind for Products {
    type Doc = ProductDoc;
    type View = Product;
    const COLLECTION: &'static str = PRODUCT_COLLECTION;
    const LABEL: &'static str = "products";

    fn sort() -> Document {
        doc! { "order": 1, "created_at": 1 }
    }

    fn defaults() -> Vec<ProductDoc> {
        defaults::products()
    }
}

impl CatalogKind for Projects {
    type Doc = ProjectDoc;
    type View = Project;
    const COLLECTION: &'static str = PROJECT_COLLECTION;
    const LABEL: &'static str = "projects";

    fn sort() -> Document {
        doc! { "year": -1, "order": 1 }
    }

    fn defaults() -> Vec<ProjectDoc> {
        defaults::projects()
    }
}

/// Number of entries inserted by [`ContentService::seed_defaults`], per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub services: usize,
    pub products: usize,
    pub projects: usize,
}

#[derive(Clone)]
pub struct ContentService {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl ContentService {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    async fn fetch_active<K: CatalogKind>(&self) -> Result<Vec<K::Doc>> {
        let docs = self
            .store
            .find_many(
                K::COLLECTION,
                doc! { "is_active": true },
                FindSpec::sorted(K::sort()),
            )
            .await?;

        let mut items = Vec::with_capacity(docs.len());
        for d in docs {
            items.push(bson::from_document::<K::Doc>(d)?);
        }
        Ok(items)
    }

    /// Active entries of kind `K`, or the built-in set when there are none
    pub async fn list<K: CatalogKind>(&self) -> CatalogListing<K::View> {
        let (docs, source) = match self.fetch_active::<K>().await {
            Ok(docs) if !docs.is_empty() => (docs, ContentSource::Store),
            Ok(_) => {
                debug!(kind = K::LABEL, "No active entries in store, serving defaults");
                (K::defaults(), ContentSource::Default)
            }
            Err(e) => {
                warn!(kind = K::LABEL, error = %e, "Catalog query failed, serving defaults");
                (K::defaults(), ContentSource::Degraded)
            }
        };

        CatalogListing::new(docs.into_iter().map(Into::into).collect(), source)
    }

    pub async fn services(&self) -> CatalogListing<Service> {
        self.list::<Services>().await
    }

    pub async fn products(&self) -> CatalogListing<Product> {
        self.list::<Products>().await
    }

    pub async fn projects(&self) -> CatalogListing<Project> {
        self.list::<Projects>().await
    }

    /// Insert a document with creation timestamps
    async fn insert_new<K: CatalogKind>(&self, doc: &K::Doc, now: DateTime) -> Result<String> {
        let mut stored = bson::to_document(doc)?;
        stored.insert("created_at", now);
        stored.insert("updated_at", now);
        self.store.insert(K::COLLECTION, stored).await
    }

    /// Add a catalog service. The create operations have no HTTP route; they
    /// are for admin tooling built on the library.
    pub async fn create_service(&self, payload: ServicePayload) -> Result<Service> {
        payload.validate()?;
        let now = DateTime::from_chrono(self.clock.now());
        let doc = ServiceDoc {
            _id: self.clock.new_id(),
            icon: payload.icon,
            title: payload.title,
            description: payload.description,
            features: payload.features,
            is_active: payload.is_active,
            order: payload.order,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.insert_new::<Services>(&doc, now).await?;
        info!(id = %doc._id, title = %doc.title, "Service created");
        Ok(doc.into())
    }

    pub async fn create_product(&self, payload: ProductPayload) -> Result<Product> {
        payload.validate()?;
        let now = DateTime::from_chrono(self.clock.now());
        let doc = ProductDoc {
            _id: self.clock.new_id(),
            icon: payload.icon,
            title: payload.title,
            subtitle: payload.subtitle,
            description: payload.description,
            features: payload.features,
            color: payload.color,
            is_active: payload.is_active,
            order: payload.order,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.insert_new::<Products>(&doc, now).await?;
        info!(id = %doc._id, title = %doc.title, "Product created");
        Ok(doc.into())
    }

    pub async fn create_project(&self, payload: ProjectPayload) -> Result<Project> {
        payload.validate()?;
        let now = DateTime::from_chrono(self.clock.now());
        let doc = ProjectDoc {
            _id: self.clock.new_id(),
            title: payload.title,
            client: payload.client,
            category: payload.category,
            description: payload.description,
            features: payload.features,
            technologies: payload.technologies,
            duration: payload.duration,
            year: payload.year,
            status: payload.status,
            icon: payload.icon,
            is_active: payload.is_active,
            order: payload.order,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.insert_new::<Projects>(&doc, now).await?;
        info!(id = %doc._id, title = %doc.title, "Project created");
        Ok(doc.into())
    }

    async fn seed_kind<K: CatalogKind>(&self) -> Result<usize> {
        if self.store.count(K::COLLECTION, None).await? > 0 {
            debug!(kind = K::LABEL, "Collection not empty, skipping seed");
            return Ok(0);
        }

        let now = DateTime::from_chrono(self.clock.now());
        let defaults = K::defaults();
        for doc in &defaults {
            self.insert_new::<K>(doc, now).await?;
        }
        info!(kind = K::LABEL, count = defaults.len(), "Seeded default content");
        Ok(defaults.len())
    }

    /// Copy the built-in catalog into every empty collection
    pub async fn seed_defaults(&self) -> Result<SeedReport> {
        Ok(SeedReport {
            services: self.seed_kind::<Services>().await?,
            products: self.seed_kind::<Products>().await?,
            projects: self.seed_kind::<Projects>().await?,
        })
    }
}
