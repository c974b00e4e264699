//! Analytics endpoints

use hyper::{Response, StatusCode};
use tracing::warn;

use crate::routes::{error_response, json_response, ApiRequest};
use crate::server::{AppState, BoxBody};
use crate::services::{metadata_document, NewEvent};
use crate::validation::AnalyticsPayload;

/// POST /api/analytics/page-view
///
/// Always answers 200. A body that is not JSON is logged and reported as
/// `{"success": false}`; missing or mistyped members fall back to defaults.
pub async fn page_view(state: &AppState, req: ApiRequest) -> Response<BoxBody> {
    let body: serde_json::Value = match req.json() {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "Ignoring undecodable analytics event");
            return json_response(StatusCode::OK, &serde_json::json!({ "success": false }));
        }
    };

    let payload = AnalyticsPayload::from_json(body);
    let metadata = payload.metadata.map(metadata_document);

    state
        .analytics
        .record(
            NewEvent::new(payload.event_type, payload.page)
                .with_client(req.client.ip_address, req.client.user_agent)
                .with_metadata(metadata),
        )
        .await;

    json_response(StatusCode::OK, &serde_json::json!({ "success": true }))
}

/// GET /api/analytics/dashboard
pub async fn dashboard(state: &AppState) -> Response<BoxBody> {
    match state.analytics.dashboard().await {
        Ok(dashboard) => json_response(StatusCode::OK, &dashboard),
        Err(e) => error_response(&e),
    }
}
