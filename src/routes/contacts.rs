//! Contact endpoints
//!
//! - POST  /api/contacts              submit the contact form
//! - GET   /api/contacts              list (`?status&limit&offset`)
//! - GET   /api/contacts/stats        submission statistics
//! - PATCH /api/contacts/{id}/status  change status (`?status=` or `{"status"}`)

use hyper::{Method, Response, StatusCode};
use serde::Deserialize;

use crate::routes::{error_response, json_response, not_found, ApiRequest};
use crate::server::{AppState, BoxBody};
use crate::services::contacts::ContactQuery;
use crate::types::ApiError;
use crate::validation::ContactPayload;

#[derive(Debug, Default, Deserialize)]
struct StatusUpdate {
    status: Option<String>,
}

/// Handle everything under /api/contacts; `subpath` has no trailing slash
pub async fn handle_contacts_request(
    state: &AppState,
    req: ApiRequest,
    subpath: &str,
) -> Response<BoxBody> {
    let result = match (req.method.clone(), subpath) {
        (Method::POST, "") => submit(state, &req).await,
        (Method::GET, "") => list(state, &req).await,
        (Method::GET, "/stats") => stats(state).await,
        (Method::PATCH, p) if p.ends_with("/status") => {
            let id = p
                .strip_prefix('/')
                .and_then(|s| s.strip_suffix("/status"))
                .unwrap_or("");
            if id.is_empty() || id.contains('/') {
                return not_found(&req.path);
            }
            update_status(state, &req, id).await
        }
        _ => return not_found(&req.path),
    };

    result.unwrap_or_else(|e| error_response(&e))
}

async fn submit(state: &AppState, req: &ApiRequest) -> Result<Response<BoxBody>, ApiError> {
    let payload = ContactPayload::from_json(req.json()?)?;
    let receipt = state.contacts.submit(payload, req.client.clone()).await?;
    Ok(json_response(StatusCode::OK, &receipt))
}

async fn list(state: &AppState, req: &ApiRequest) -> Result<Response<BoxBody>, ApiError> {
    let query: ContactQuery = req.query()?;
    let contacts = state.contacts.list(query).await?;
    Ok(json_response(StatusCode::OK, &contacts))
}

async fn stats(state: &AppState) -> Result<Response<BoxBody>, ApiError> {
    let stats = state.contacts.stats().await?;
    Ok(json_response(StatusCode::OK, &stats))
}

async fn update_status(
    state: &AppState,
    req: &ApiRequest,
    id: &str,
) -> Result<Response<BoxBody>, ApiError> {
    let from_query: StatusUpdate = req.query()?;
    let status = match from_query.status {
        Some(status) => status,
        None if !req.body.is_empty() => req
            .json::<StatusUpdate>()?
            .status
            .ok_or_else(|| ApiError::BadRequest("status is required".into()))?,
        None => return Err(ApiError::BadRequest("status is required".into())),
    };

    state.contacts.update_status(id, &status).await?;

    Ok(json_response(
        StatusCode::OK,
        &serde_json::json!({
            "success": true,
            "message": "Status updated successfully",
        }),
    ))
}
