//! MongoDB client and document store backend

use async_trait::async_trait;
use bson::{doc, DateTime, Document};
use futures_util::TryStreamExt;
use mongodb::{
    options::{FindOptions, IndexOptions},
    Client, Collection, IndexModel,
};
use tracing::{debug, info};

use crate::db::store::{id_to_string, stamp_updated_at, DocumentStore, FindSpec};
use crate::types::{ApiError, Result};

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Create a new MongoDB client
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        info!("Connecting to MongoDB at {}", uri);

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| ApiError::Store(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| ApiError::Store(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Create the indexes a schema declares on `collection_name`
    pub async fn ensure_indexes<T: IntoIndexes>(&self, collection_name: &str) -> Result<()> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.raw(collection_name)
            .create_indexes(indices)
            .await
            .map_err(|e| ApiError::Store(format!("Failed to create indexes: {}", e)))?;

        debug!("Indexes ensured on '{}'", collection_name);
        Ok(())
    }

    /// Untyped handle on a collection
    fn raw(&self, name: &str) -> Collection<Document> {
        self.client.database(&self.db_name).collection::<Document>(name)
    }
}

#[async_trait]
impl DocumentStore for MongoClient {
    async fn insert(&self, collection: &str, doc: Document) -> Result<String> {
        let result = self
            .raw(collection)
            .insert_one(doc)
            .await
            .map_err(|e| ApiError::Store(format!("Insert failed: {}", e)))?;

        Ok(id_to_string(&result.inserted_id))
    }

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>> {
        self.raw(collection)
            .find_one(filter)
            .await
            .map_err(|e| ApiError::Store(format!("Find failed: {}", e)))
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: Document,
        spec: FindSpec,
    ) -> Result<Vec<Document>> {
        let options = FindOptions::builder()
            .sort(spec.sort)
            .skip(spec.skip)
            .limit(spec.limit)
            .build();

        let cursor = self
            .raw(collection)
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| ApiError::Store(format!("Find failed: {}", e)))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| ApiError::Store(format!("Cursor read failed: {}", e)))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        mut patch: Document,
    ) -> Result<u64> {
        stamp_updated_at(&mut patch, DateTime::now());

        let result = self
            .raw(collection)
            .update_one(filter, patch)
            .await
            .map_err(|e| ApiError::Store(format!("Update failed: {}", e)))?;

        Ok(result.matched_count)
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> Result<u64> {
        let result = self
            .raw(collection)
            .delete_one(filter)
            .await
            .map_err(|e| ApiError::Store(format!("Delete failed: {}", e)))?;

        Ok(result.deleted_count)
    }

    async fn count(&self, collection: &str, filter: Option<Document>) -> Result<u64> {
        self.raw(collection)
            .count_documents(filter.unwrap_or_default())
            .await
            .map_err(|e| ApiError::Store(format!("Count failed: {}", e)))
    }

    async fn aggregate(&self, collection: &str, pipeline: Vec<Document>) -> Result<Vec<Document>> {
        let cursor = self
            .raw(collection)
            .aggregate(pipeline)
            .await
            .map_err(|e| ApiError::Store(format!("Aggregate failed: {}", e)))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| ApiError::Store(format!("Cursor read failed: {}", e)))
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
        info!("Disconnected from MongoDB");
    }

    fn backend(&self) -> &'static str {
        "mongodb"
    }
}

