//! Catalog document schemas
//!
//! Services, products and projects shown on the marketing site. Documents keep
//! the display `order` and `is_active` flag the listing queries filter on.

use bson::{doc, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name for services
pub const SERVICE_COLLECTION: &str = "services";

/// Collection name for products
pub const PRODUCT_COLLECTION: &str = "products";

/// Collection name for projects
pub const PROJECT_COLLECTION: &str = "projects";

/// A product feature: either a bare label or a label with an icon
///
/// Serialized untagged, so `"Payroll"` and `{"icon": "Clock", "text": "Payroll"}`
/// are both accepted.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum Feature {
    PlainText(String),
    IconText {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        icon: Option<String>,
        text: String,
    },
}

impl Feature {
    /// The feature's label regardless of shape
    pub fn text(&self) -> &str {
        match self {
            Feature::PlainText(text) => text,
            Feature::IconText { text, .. } => text,
        }
    }
}

impl From<&str> for Feature {
    fn from(text: &str) -> Self {
        Feature::PlainText(text.to_string())
    }
}

fn default_active() -> bool {
    true
}

/// Service document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ServiceDoc {
    pub _id: String,
    pub icon: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

/// Product document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProductDoc {
    pub _id: String,
    pub icon: String,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    #[serde(default)]
    pub features: Vec<Feature>,
    /// CSS gradient classes, e.g. `from-blue-500 to-blue-600`
    #[serde(default)]
    pub color: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

/// Project (portfolio entry) document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProjectDoc {
    pub _id: String,
    pub title: String,
    pub client: String,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub duration: String,
    /// Year as displayed, e.g. "2023"; sorts lexically
    pub year: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

fn active_order_index() -> (Document, Option<IndexOptions>) {
    (
        doc! { "is_active": 1, "order": 1 },
        Some(
            IndexOptions::builder()
                .name("active_order_index".to_string())
                .build(),
        ),
    )
}

impl IntoIndexes for ServiceDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            active_order_index(),
            (
                doc! { "title": 1 },
                Some(IndexOptions::builder().name("title_index".to_string()).build()),
            ),
        ]
    }
}

impl IntoIndexes for ProductDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            active_order_index(),
            (
                doc! { "title": 1 },
                Some(IndexOptions::builder().name("title_index".to_string()).build()),
            ),
        ]
    }
}

impl IntoIndexes for ProjectDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            active_order_index(),
            (
                doc! { "year": -1 },
                Some(IndexOptions::builder().name("year_desc".to_string()).build()),
            ),
            (
                doc! { "client": 1 },
                Some(IndexOptions::builder().name("client_index".to_string()).build()),
            ),
        ]
    }
}
