//! Database schemas
//!
//! Document structures for contacts, catalog entries and analytics events.

mod analytics;
mod catalog;
mod contact;

pub use analytics::{AnalyticsEventDoc, ANALYTICS_COLLECTION, CONTACT_FORM, PAGE_VIEW};
pub use catalog::{
    Feature, ProductDoc, ProjectDoc, ServiceDoc, PRODUCT_COLLECTION, PROJECT_COLLECTION,
    SERVICE_COLLECTION,
};
pub use contact::{ContactDoc, ContactStatus, CONTACT_COLLECTION};
