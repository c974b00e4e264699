//! Document store abstraction
//!
//! Every component talks to the database through [`DocumentStore`]. The trait
//! is a thin pass-through over named collections of BSON documents; the only
//! convenience it adds is stamping `updated_at` on every update.

use async_trait::async_trait;
use bson::{doc, DateTime, Document};

use crate::types::Result;

/// Sort, skip and limit applied by [`DocumentStore::find_many`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindSpec {
    /// Sort keys in priority order, `1` ascending and `-1` descending
    pub sort: Option<Document>,
    /// Number of leading matches to skip
    pub skip: Option<u64>,
    /// Maximum number of documents to return
    pub limit: Option<i64>,
}

impl FindSpec {
    /// Spec with only a sort order
    pub fn sorted(sort: Document) -> Self {
        Self {
            sort: Some(sort),
            ..Self::default()
        }
    }

    /// Set the skip count
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Set the result limit
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Generic access to named document collections
///
/// All operations fail fast: a connectivity or operation failure is returned
/// as [`crate::types::ApiError::Store`] with no retry.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document, returning its `_id` rendered as a string
    async fn insert(&self, collection: &str, doc: Document) -> Result<String>;

    /// First document matching `filter`
    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>>;

    /// All documents matching `filter`. Without a sort the order is whatever
    /// the backend yields and is not guaranteed stable.
    async fn find_many(
        &self,
        collection: &str,
        filter: Document,
        spec: FindSpec,
    ) -> Result<Vec<Document>>;

    /// Apply `patch` to the first match, returning the matched count.
    /// `updated_at` is always set to the current time.
    async fn update_one(&self, collection: &str, filter: Document, patch: Document)
        -> Result<u64>;

    /// Delete the first match, returning the deleted count
    async fn delete_one(&self, collection: &str, filter: Document) -> Result<u64>;

    /// Count documents matching `filter` (all documents when `None`)
    async fn count(&self, collection: &str, filter: Option<Document>) -> Result<u64>;

    /// Run an aggregation pipeline
    async fn aggregate(&self, collection: &str, pipeline: Vec<Document>) -> Result<Vec<Document>>;

    /// Release the underlying connection. Called once at shutdown.
    async fn close(&self) {}

    /// Backend name for logs and health output
    fn backend(&self) -> &'static str;
}

/// Add `updated_at` to the `$set` stage of an update, creating it if absent
pub fn stamp_updated_at(patch: &mut Document, now: DateTime) {
    if let Ok(set) = patch.get_document_mut("$set") {
        set.insert("updated_at", now);
        return;
    }
    patch.insert("$set", doc! { "updated_at": now });
}

/// Render an `_id` value as a string
pub fn id_to_string(id: &bson::Bson) -> String {
    match id {
        bson::Bson::String(s) => s.clone(),
        bson::Bson::ObjectId(oid) => oid.to_hex(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_creates_set_stage() {
        let now = DateTime::now();
        let mut patch = doc! { "$inc": { "views": 1 } };
        stamp_updated_at(&mut patch, now);

        assert_eq!(patch.get_document("$set").unwrap().get_datetime("updated_at").unwrap(), &now);
        assert!(patch.contains_key("$inc"));
    }

    #[test]
    fn test_stamp_extends_existing_set() {
        let now = DateTime::now();
        let mut patch = doc! { "$set": { "status": "closed" } };
        stamp_updated_at(&mut patch, now);

        let set = patch.get_document("$set").unwrap();
        assert_eq!(set.get_str("status").unwrap(), "closed");
        assert_eq!(set.get_datetime("updated_at").unwrap(), &now);
    }

    #[test]
    fn test_find_spec_builder() {
        let spec = FindSpec::sorted(doc! { "created_at": -1 }).skip(10).limit(5);
        assert_eq!(spec.sort, Some(doc! { "created_at": -1 }));
        assert_eq!(spec.skip, Some(10));
        assert_eq!(spec.limit, Some(5));
    }

    #[test]
    fn test_id_to_string() {
        assert_eq!(id_to_string(&bson::Bson::String("abc".into())), "abc");
        let oid = bson::oid::ObjectId::new();
        assert_eq!(id_to_string(&bson::Bson::ObjectId(oid)), oid.to_hex());
    }
}
