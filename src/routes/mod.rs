//! HTTP routes for the Mabratech API
//!
//! All endpoints live under `/api`. Responses are JSON with permissive CORS
//! headers; errors use `{"error", "message", "field"?}`.

pub mod analytics;
pub mod contacts;
pub mod content;
pub mod health;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::server::{AppState, BoxBody};
use crate::services::content::{Products, Projects, Services};
use crate::services::ClientInfo;
use crate::types::ApiError;

/// A request with its body already read
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub body: Bytes,
    pub client: ClientInfo,
}

impl ApiRequest {
    /// Decode the query string, treating a missing one as empty
    pub fn query<T: for<'de> Deserialize<'de>>(&self) -> Result<T, ApiError> {
        serde_urlencoded::from_str(self.query.as_deref().unwrap_or(""))
            .map_err(|e| ApiError::BadRequest(format!("Invalid query string: {}", e)))
    }

    /// Decode the JSON body
    pub fn json<T: for<'de> Deserialize<'de>>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON: {}", e)))
    }
}

/// Route a request to its handler
pub async fn dispatch(state: &AppState, req: ApiRequest) -> Response<BoxBody> {
    if req.method == Method::OPTIONS {
        return cors_preflight();
    }

    let path = match req.path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
    .to_string();

    match (req.method.clone(), path.as_str()) {
        (Method::GET, "/api/health") => health::health_check(state),
        (Method::GET, "/api") => health::root(),

        (_, p) if p == "/api/contacts" || p.starts_with("/api/contacts/") => {
            let subpath = p.strip_prefix("/api/contacts").unwrap_or("").to_string();
            contacts::handle_contacts_request(state, req, &subpath).await
        }

        (Method::GET, "/api/services") => content::listing::<Services>(state).await,
        (Method::GET, "/api/products") => content::listing::<Products>(state).await,
        (Method::GET, "/api/projects") => content::listing::<Projects>(state).await,

        (Method::POST, "/api/analytics/page-view") => analytics::page_view(state, req).await,
        (Method::GET, "/api/analytics/dashboard") => analytics::dashboard(state).await,

        _ => not_found(&req.path),
    }
}

pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PATCH, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .body(full_body(json))
        .unwrap()
}

/// JSON error body with the status the error maps to
pub fn error_response(err: &ApiError) -> Response<BoxBody> {
    let message = match err {
        ApiError::Validation { .. } => err.to_string(),
        ApiError::NotFound(m)
        | ApiError::InvalidState(m)
        | ApiError::Store(m)
        | ApiError::BadRequest(m)
        | ApiError::Config(m)
        | ApiError::Internal(m) => m.clone(),
    };

    if err.status_code().is_server_error() {
        error!(kind = err.kind(), "{}", err);
    }

    let mut body = serde_json::json!({
        "error": err.kind(),
        "message": message,
    });
    if let Some(field) = err.field() {
        body["field"] = serde_json::Value::String(field.to_string());
    }

    json_response(err.status_code(), &body)
}

fn cors_preflight() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PATCH, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .header("Access-Control-Max-Age", "86400")
        .body(empty_body())
        .unwrap()
}

pub(crate) fn not_found(path: &str) -> Response<BoxBody> {
    let body = serde_json::json!({
        "error": "not_found",
        "message": format!("No route for {}", path),
    });
    json_response(StatusCode::NOT_FOUND, &body)
}

fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}
