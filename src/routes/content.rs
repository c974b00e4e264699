//! Catalog listing endpoints: /api/services, /api/products, /api/projects

use hyper::{Response, StatusCode};
use serde_json::{Map, Value};

use crate::routes::json_response;
use crate::server::{AppState, BoxBody};
use crate::services::CatalogKind;

/// `{"<kind>": [...], "total": n, "source": "store" | "default" | "degraded"}`
pub async fn listing<K: CatalogKind>(state: &AppState) -> Response<BoxBody> {
    let listing = state.content.list::<K>().await;

    let mut body = Map::new();
    body.insert(
        K::LABEL.to_string(),
        serde_json::to_value(&listing.items).unwrap_or_else(|_| Value::Array(Vec::new())),
    );
    body.insert("total".to_string(), Value::from(listing.total));
    body.insert(
        "source".to_string(),
        serde_json::to_value(listing.source).unwrap_or(Value::Null),
    );

    json_response(StatusCode::OK, &body)
}
