//! Health and welcome endpoints

use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::routes::json_response;
use crate::server::{AppState, BoxBody};

pub const SERVICE_NAME: &str = "Mabratech API";

#[derive(Serialize)]
pub struct HealthResponse {
    /// Always "healthy" while the process serves requests
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    /// Store backend in use ("mongodb" or "memory")
    pub store: &'static str,
    /// Notification/analytics items dropped because the queue was full
    pub dropped_side_effects: u64,
}

/// GET /api/health
pub fn health_check(state: &AppState) -> Response<BoxBody> {
    let response = HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        store: state.store.backend(),
        dropped_side_effects: state.queue.dropped(),
    };
    json_response(StatusCode::OK, &response)
}

/// GET /api/
pub fn root() -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &serde_json::json!({
            "message": "Welcome to Mabratech API",
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )
}
