//! Contact submission pipeline and administration
//!
//! A submission is validated, persisted, and then handed to the side-effect
//! queue for notification and analytics. The request is complete once the
//! record is persisted; what happens to the queued work never reaches the
//! caller.

use bson::{doc, Bson, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::db::schemas::{ContactDoc, ContactStatus, CONTACT_COLLECTION, CONTACT_FORM};
use crate::db::{DocumentStore, FindSpec};
use crate::services::analytics::NewEvent;
use crate::services::count_field;
use crate::types::{ApiError, Clock, Result};
use crate::validation::{ContactPayload, Validate};
use crate::worker::{SideEffect, SideEffectQueue};

/// Confirmation shown to the submitter
pub const SUBMIT_SUCCESS_MESSAGE: &str =
    "Terima kasih! Pesan Anda telah berhasil dikirim. Tim kami akan segera menghubungi Anda.";

/// Shown instead of internal details when persisting a submission fails
pub const SUBMIT_FAILED_MESSAGE: &str =
    "Terjadi kesalahan sistem. Silakan coba lagi atau hubungi kami langsung.";

pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 200;

/// Months reported by [`ContactService::stats`]
const STATS_MONTHS: i64 = 6;

/// Requester details captured by the transport, never taken from the payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub success: bool,
    pub message: String,
    pub id: String,
}

/// Stored contact as returned by the API
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub service: String,
    pub message: String,
    pub status: ContactStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl From<ContactDoc> for Contact {
    fn from(doc: ContactDoc) -> Self {
        Self {
            id: doc._id,
            name: doc.name,
            email: doc.email,
            phone: doc.phone,
            company: doc.company,
            service: doc.service,
            message: doc.message,
            status: doc.status,
            created_at: doc.created_at.to_chrono(),
            updated_at: doc.updated_at.to_chrono(),
            ip_address: doc.ip_address,
            user_agent: doc.user_agent,
        }
    }
}

/// Filter and page for listing contacts
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ContactQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContactList {
    pub contacts: Vec<Contact>,
    /// All matches of the filter, ignoring paging
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ServiceCount {
    pub service: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MonthCount {
    pub year: i32,
    pub month: u32,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContactStats {
    pub total_submissions: u64,
    pub by_service: Vec<ServiceCount>,
    pub by_month: Vec<MonthCount>,
}

/// Contacts grouped by requested service, most requested first
pub async fn contacts_by_service(store: &dyn DocumentStore) -> Result<Vec<ServiceCount>> {
    let rows = store
        .aggregate(
            CONTACT_COLLECTION,
            vec![
                doc! { "$group": { "_id": "$service", "count": { "$sum": 1 } } },
                doc! { "$sort": { "count": -1 } },
            ],
        )
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| ServiceCount {
            service: row.get_str("_id").unwrap_or_default().to_string(),
            count: count_field(&row, "count"),
        })
        .collect())
}

fn int_field(doc: &Document, key: &str) -> i64 {
    match doc.get(key) {
        Some(Bson::Int32(v)) => i64::from(*v),
        Some(Bson::Int64(v)) => *v,
        _ => 0,
    }
}

/// Drop blank optional fields so they are stored as absent
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Clone)]
pub struct ContactService {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    queue: SideEffectQueue,
}

impl ContactService {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>, queue: SideEffectQueue) -> Self {
        Self { store, clock, queue }
    }

    /// Validate, persist and enqueue side effects for a new submission
    pub async fn submit(&self, payload: ContactPayload, client: ClientInfo) -> Result<SubmissionReceipt> {
        payload.validate()?;

        let now = bson::DateTime::from_chrono(self.clock.now());
        let contact = ContactDoc {
            _id: self.clock.new_id(),
            name: payload.name,
            email: payload.email,
            phone: non_blank(payload.phone),
            company: non_blank(payload.company),
            service: payload.service,
            message: payload.message,
            status: ContactStatus::New,
            created_at: now,
            updated_at: now,
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
        };

        let stored = bson::to_document(&contact)?;
        if let Err(e) = self.store.insert(CONTACT_COLLECTION, stored).await {
            error!(error = %e, email = %contact.email, "Error creating contact");
            return Err(ApiError::Store(SUBMIT_FAILED_MESSAGE.to_string()));
        }

        info!(contact_id = %contact._id, email = %contact.email, "New contact submission");

        let metadata = doc! {
            "service": contact.service.clone(),
            "company": contact.company.clone(),
        };
        let id = contact._id.clone();

        self.queue.enqueue(SideEffect::Notify(contact));
        self.queue.enqueue(SideEffect::Track(
            NewEvent::new(CONTACT_FORM, "contact")
                .with_client(client.ip_address, client.user_agent)
                .with_metadata(Some(metadata)),
        ));

        Ok(SubmissionReceipt {
            success: true,
            message: SUBMIT_SUCCESS_MESSAGE.to_string(),
            id,
        })
    }

    /// Newest first, optionally filtered by status
    pub async fn list(&self, query: ContactQuery) -> Result<ContactList> {
        let mut filter = Document::new();
        if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
            let status: ContactStatus = status.parse()?;
            filter.insert("status", status.as_str());
        }

        let limit = query
            .limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT);
        let spec = FindSpec::sorted(doc! { "created_at": -1 })
            .skip(query.offset.unwrap_or(0))
            .limit(limit);

        let contacts = self
            .store
            .find_many(CONTACT_COLLECTION, filter.clone(), spec)
            .await?
            .into_iter()
            .map(|d| bson::from_document::<ContactDoc>(d).map(Contact::from))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let total = self.store.count(CONTACT_COLLECTION, Some(filter)).await?;

        Ok(ContactList { contacts, total })
    }

    /// Move a contact to `status`
    ///
    /// An unknown status is rejected before the store is touched.
    pub async fn update_status(&self, id: &str, status: &str) -> Result<()> {
        let status: ContactStatus = status.parse()?;

        let matched = self
            .store
            .update_one(
                CONTACT_COLLECTION,
                doc! { "_id": id },
                doc! { "$set": { "status": status.as_str() } },
            )
            .await?;

        if matched == 0 {
            return Err(ApiError::NotFound(format!("Contact {} not found", id)));
        }

        info!(contact_id = %id, status = %status, "Contact status updated");
        Ok(())
    }

    pub async fn stats(&self) -> Result<ContactStats> {
        let total_submissions = self.store.count(CONTACT_COLLECTION, None).await?;
        let by_service = contacts_by_service(self.store.as_ref()).await?;

        let by_month = self
            .store
            .aggregate(
                CONTACT_COLLECTION,
                vec![
                    doc! { "$group": {
                        "_id": {
                            "year": { "$year": "$created_at" },
                            "month": { "$month": "$created_at" },
                        },
                        "count": { "$sum": 1 },
                    } },
                    doc! { "$sort": { "_id.year": -1, "_id.month": -1 } },
                    doc! { "$limit": STATS_MONTHS },
                ],
            )
            .await?
            .into_iter()
            .filter_map(|row| {
                let key = row.get_document("_id").ok()?;
                Some(MonthCount {
                    year: int_field(key, "year") as i32,
                    month: int_field(key, "month") as u32,
                    count: count_field(&row, "count"),
                })
            })
            .collect();

        Ok(ContactStats {
            total_submissions,
            by_service,
            by_month,
        })
    }
}
