//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bson::Document;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use clap::Parser;
use http_body_util::BodyExt;
use hyper::{Method, Response, StatusCode};
use std::sync::Arc;
use tokio::sync::mpsc;

use mabratech_api::db::{DocumentStore, FindSpec, MemoryStore};
use mabratech_api::routes::{self, ApiRequest};
use mabratech_api::server::{AppState, BoxBody};
use mabratech_api::services::ClientInfo;
use mabratech_api::types::{ApiError, FixedClock, Result};
use mabratech_api::worker::{SideEffect, SideEffectQueue};
use mabratech_api::Args;

/// Store whose every call fails, as if MongoDB were unreachable
pub struct FailingStore;

fn down<T>() -> Result<T> {
    Err(ApiError::Store("connection refused".into()))
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn insert(&self, _: &str, _: Document) -> Result<String> {
        down()
    }
    async fn find_one(&self, _: &str, _: Document) -> Result<Option<Document>> {
        down()
    }
    async fn find_many(&self, _: &str, _: Document, _: FindSpec) -> Result<Vec<Document>> {
        down()
    }
    async fn update_one(&self, _: &str, _: Document, _: Document) -> Result<u64> {
        down()
    }
    async fn delete_one(&self, _: &str, _: Document) -> Result<u64> {
        down()
    }
    async fn count(&self, _: &str, _: Option<Document>) -> Result<u64> {
        down()
    }
    async fn aggregate(&self, _: &str, _: Vec<Document>) -> Result<Vec<Document>> {
        down()
    }
    fn backend(&self) -> &'static str {
        "failing"
    }
}

pub struct TestApp {
    pub state: AppState,
    pub clock: Arc<FixedClock>,
    pub side_effects: mpsc::Receiver<SideEffect>,
}

impl TestApp {
    pub fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        let args = Args::parse_from(["mabratech-api"]);
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap(),
        ));
        let (queue, side_effects) = SideEffectQueue::new(64);
        let state = AppState::new(args, store, clock.clone(), queue);
        Self {
            state,
            clock,
            side_effects,
        }
    }

    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub async fn call(&self, method: Method, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
        let body = body
            .map(|b| Bytes::from(b.to_string()))
            .unwrap_or_default();
        self.call_raw(method, uri, body).await
    }

    pub async fn call_raw(&self, method: Method, uri: &str, body: Bytes) -> (StatusCode, serde_json::Value) {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (uri.to_string(), None),
        };
        let request = ApiRequest {
            method,
            path,
            query,
            body,
            client: ClientInfo {
                ip_address: Some("203.0.113.7".into()),
                user_agent: Some("integration-test".into()),
            },
        };
        read_json(routes::dispatch(&self.state, request).await).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        self.call(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        self.call(Method::POST, uri, Some(body)).await
    }
}

pub async fn read_json(response: Response<BoxBody>) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

pub fn budi() -> serde_json::Value {
    serde_json::json!({
        "name": "Budi",
        "email": "budi@x.com",
        "service": "ERP",
        "message": "This is a sufficiently long message."
    })
}
