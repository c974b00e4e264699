//! Analytics recording and dashboard aggregation
//!
//! Events are append-only. Recording never fails from the caller's point of
//! view: a store error is logged and the event is dropped.

use bson::{doc, Bson, Document};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::db::schemas::{AnalyticsEventDoc, ANALYTICS_COLLECTION, CONTACT_COLLECTION, PAGE_VIEW};
use crate::db::{DocumentStore, FindSpec};
use crate::services::contacts::{contacts_by_service, ServiceCount};
use crate::services::count_field;
use crate::types::{Clock, Result};

/// Default dashboard window
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

const TOP_PAGES: i64 = 5;
const RECENT_EVENTS: i64 = 10;

/// Event to record; the id and timestamp are assigned on insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub event_type: String,
    pub page: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: Option<Document>,
}

impl NewEvent {
    pub fn new(event_type: impl Into<String>, page: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            page: page.into(),
            ip_address: None,
            user_agent: None,
            metadata: None,
        }
    }

    /// Attach the requesting client's address and user agent
    pub fn with_client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    pub fn with_metadata(mut self, metadata: Option<Document>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Convert posted metadata to BSON entry by entry
///
/// An entry BSON cannot hold (an integer above `i64::MAX`, say) is logged
/// and left out; the rest of the map is kept.
pub fn metadata_document(metadata: serde_json::Map<String, serde_json::Value>) -> Document {
    let mut converted = Document::new();
    for (key, value) in metadata {
        match bson::to_bson(&value) {
            Ok(value) => {
                converted.insert(key, value);
            }
            Err(e) => warn!(key = %key, error = %e, "Dropping unrepresentable metadata entry"),
        }
    }
    converted
}

/// Stored event as returned by the API
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalyticsEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub page: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<AnalyticsEventDoc> for AnalyticsEvent {
    fn from(doc: AnalyticsEventDoc) -> Self {
        Self {
            id: doc._id,
            event_type: doc.event_type,
            page: doc.page,
            metadata: doc.metadata.map(|m| Bson::Document(m).into_relaxed_extjson()),
            ip_address: doc.ip_address,
            user_agent: doc.user_agent,
            timestamp: doc.timestamp.to_chrono(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PageViews {
    pub page: String,
    pub views: u64,
}

/// Aggregated site activity
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Dashboard {
    /// Page views inside the window
    pub total_page_views: u64,
    /// All contacts ever submitted
    pub total_contacts: u64,
    pub top_pages: Vec<PageViews>,
    pub contacts_by_service: Vec<ServiceCount>,
    /// Newest events of any type, newest first
    pub recent_activity: Vec<AnalyticsEvent>,
}

/// Records events and computes the dashboard
#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    window: Duration,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            window: Duration::days(DEFAULT_WINDOW_DAYS),
        }
    }

    /// Use a different trailing window for windowed counts
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Append an event. Failures are logged and swallowed.
    pub async fn record(&self, event: NewEvent) {
        let doc = AnalyticsEventDoc {
            _id: self.clock.new_id(),
            event_type: event.event_type,
            page: event.page,
            metadata: event.metadata,
            ip_address: event.ip_address,
            user_agent: event.user_agent,
            timestamp: bson::DateTime::from_chrono(self.clock.now()),
        };

        let stored = match bson::to_document(&doc) {
            Ok(stored) => stored,
            Err(e) => {
                error!(error = %e, "Failed to encode analytics event");
                return;
            }
        };

        match self.store.insert(ANALYTICS_COLLECTION, stored).await {
            Ok(_) => debug!(event_type = %doc.event_type, page = %doc.page, "Tracked analytics event"),
            Err(e) => error!(error = %e, event_type = %doc.event_type, "Error tracking analytics event"),
        }
    }

    /// Compute the dashboard over the trailing window ending now
    pub async fn dashboard(&self) -> Result<Dashboard> {
        let since = bson::DateTime::from_chrono(self.clock.now() - self.window);
        let in_window = doc! { "type": PAGE_VIEW, "timestamp": { "$gte": since } };

        let total_page_views = self
            .store
            .count(ANALYTICS_COLLECTION, Some(in_window.clone()))
            .await?;

        let total_contacts = self.store.count(CONTACT_COLLECTION, None).await?;

        let top_pages = self
            .store
            .aggregate(
                ANALYTICS_COLLECTION,
                vec![
                    doc! { "$match": in_window },
                    doc! { "$group": { "_id": "$page", "views": { "$sum": 1 } } },
                    doc! { "$sort": { "views": -1 } },
                    doc! { "$limit": TOP_PAGES },
                ],
            )
            .await?
            .into_iter()
            .map(|row| PageViews {
                page: row.get_str("_id").unwrap_or_default().to_string(),
                views: count_field(&row, "views"),
            })
            .collect();

        let contacts_by_service = contacts_by_service(self.store.as_ref()).await?;

        let recent_activity = self
            .store
            .find_many(
                ANALYTICS_COLLECTION,
                doc! {},
                FindSpec::sorted(doc! { "timestamp": -1 }).limit(RECENT_EVENTS),
            )
            .await?
            .into_iter()
            .map(|d| bson::from_document::<AnalyticsEventDoc>(d).map(AnalyticsEvent::from))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Dashboard {
            total_page_views,
            total_contacts,
            top_pages,
            contacts_by_service,
            recent_activity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::types::FixedClock;

    fn service() -> (AnalyticsService, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let service = AnalyticsService::new(Arc::new(MemoryStore::new()), clock.clone());
        (service, clock)
    }

    #[tokio::test]
    async fn test_duplicate_events_both_counted() {
        let (analytics, _) = service();
        let before = analytics.dashboard().await.unwrap().total_page_views;

        let event = NewEvent::new(PAGE_VIEW, "/");
        analytics.record(event.clone()).await;
        analytics.record(event).await;

        let dashboard = analytics.dashboard().await.unwrap();
        assert_eq!(dashboard.total_page_views, before + 2);
        assert_eq!(dashboard.recent_activity.len(), 2);
        assert_ne!(dashboard.recent_activity[0].id, dashboard.recent_activity[1].id);
    }

    #[tokio::test]
    async fn test_window_boundary() {
        let (analytics, clock) = service();
        let now = clock.now();

        clock.set(now - Duration::days(31));
        analytics.record(NewEvent::new(PAGE_VIEW, "/old")).await;
        clock.set(now - Duration::days(29));
        analytics.record(NewEvent::new(PAGE_VIEW, "/recent")).await;
        clock.set(now);

        let dashboard = analytics.dashboard().await.unwrap();
        assert_eq!(dashboard.total_page_views, 1);
        assert_eq!(dashboard.top_pages, vec![PageViews { page: "/recent".into(), views: 1 }]);
        // recent activity is not windowed
        assert_eq!(dashboard.recent_activity.len(), 2);
        assert_eq!(dashboard.recent_activity[0].page, "/recent");
    }

    #[tokio::test]
    async fn test_custom_window() {
        let (analytics, clock) = service();
        let analytics = analytics.with_window(Duration::days(7));
        let now = clock.now();

        clock.set(now - Duration::days(8));
        analytics.record(NewEvent::new(PAGE_VIEW, "/")).await;
        clock.set(now);

        assert_eq!(analytics.dashboard().await.unwrap().total_page_views, 0);
    }

    #[tokio::test]
    async fn test_top_pages_limited_and_ordered() {
        let (analytics, _) = service();
        let pages = [("/", 6), ("/services", 5), ("/products", 4), ("/projects", 3), ("/about", 2), ("/contact", 1)];
        for (page, views) in pages {
            for _ in 0..views {
                analytics.record(NewEvent::new(PAGE_VIEW, page)).await;
            }
        }
        analytics.record(NewEvent::new("button_click", "/")).await;

        let dashboard = analytics.dashboard().await.unwrap();
        assert_eq!(dashboard.total_page_views, 21);
        assert_eq!(dashboard.top_pages.len(), 5);
        assert_eq!(dashboard.top_pages[0], PageViews { page: "/".into(), views: 6 });
        assert!(dashboard.top_pages.iter().all(|p| p.page != "/contact"));
        assert_eq!(dashboard.recent_activity.len(), 10);
    }

    #[test]
    fn test_metadata_keeps_representable_entries() {
        let metadata = serde_json::json!({
            "n": u64::MAX,
            "ref": "google",
            "nested": { "depth": 2 }
        });

        let converted = metadata_document(metadata.as_object().unwrap().clone());
        assert!(!converted.contains_key("n"));
        assert_eq!(converted.get_str("ref").unwrap(), "google");
        assert!(converted.get_document("nested").is_ok());
    }

    #[tokio::test]
    async fn test_metadata_exposed_as_json() {
        let (analytics, _) = service();
        analytics
            .record(
                NewEvent::new("contact_form", "contact")
                    .with_client(Some("10.0.0.1".into()), None)
                    .with_metadata(Some(doc! { "service": "ERP" })),
            )
            .await;

        let dashboard = analytics.dashboard().await.unwrap();
        let event = &dashboard.recent_activity[0];
        assert_eq!(event.event_type, "contact_form");
        assert_eq!(event.metadata, Some(serde_json::json!({ "service": "ERP" })));
        assert_eq!(event.ip_address.as_deref(), Some("10.0.0.1"));
        assert_eq!(dashboard.total_page_views, 0);
    }
}
