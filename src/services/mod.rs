//! Business services
//!
//! Each service holds the shared store handle and clock; none of them keep
//! entity state between calls.

pub mod analytics;
pub mod contacts;
pub mod content;
pub mod defaults;
pub mod notify;

pub use analytics::{metadata_document, AnalyticsService, Dashboard, NewEvent};
pub use contacts::{ClientInfo, ContactService};
pub use content::{CatalogKind, CatalogListing, ContentService, ContentSource};
pub use notify::{DisabledNotifier, MailRelayNotifier, Notifier};

use bson::{Bson, Document};

/// Read an aggregation count, whatever numeric type the backend produced
pub(crate) fn count_field(doc: &Document, key: &str) -> u64 {
    match doc.get(key) {
        Some(Bson::Int32(v)) => u64::try_from(*v).unwrap_or(0),
        Some(Bson::Int64(v)) => u64::try_from(*v).unwrap_or(0),
        Some(Bson::Double(v)) if *v > 0.0 => *v as u64,
        _ => 0,
    }
}
