//! Analytics event schema

use bson::{doc, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name for analytics events
pub const ANALYTICS_COLLECTION: &str = "analytics";

/// Event type recorded for page views
pub const PAGE_VIEW: &str = "page_view";

/// Event type recorded for contact form submissions
pub const CONTACT_FORM: &str = "contact_form";

/// Append-only analytics fact
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AnalyticsEventDoc {
    pub _id: String,

    /// Free-text tag such as `page_view`
    #[serde(rename = "type")]
    pub event_type: String,

    pub page: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Document>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    pub timestamp: DateTime,
}

impl IntoIndexes for AnalyticsEventDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "timestamp": -1 },
                Some(
                    IndexOptions::builder()
                        .name("timestamp_desc".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "type": 1 },
                Some(IndexOptions::builder().name("type_index".to_string()).build()),
            ),
            (
                doc! { "page": 1 },
                Some(IndexOptions::builder().name("page_index".to_string()).build()),
            ),
        ]
    }
}
