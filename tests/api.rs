//! End-to-end tests through the router over the in-memory store

mod common;

use bytes::Bytes;
use chrono::Duration;
use hyper::{Method, StatusCode};
use serde_json::json;
use std::sync::Arc;

use common::{budi, FailingStore, TestApp};
use mabratech_api::types::Clock;
use mabratech_api::worker::SideEffect;

#[tokio::test]
async fn test_budi_submission_scenario() {
    let mut app = TestApp::new();

    let (status, body) = app.post("/api/contacts", budi()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let id = body["id"].as_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&id).is_ok());

    let (status, listed) = app.get("/api/contacts").await;
    assert_eq!(status, StatusCode::OK);
    assert!(listed["total"].as_u64().unwrap() >= 1);
    let record = &listed["contacts"][0];
    assert_eq!(record["id"], id.as_str());
    assert_eq!(record["status"], "new");
    assert_eq!(record["ip_address"], "203.0.113.7");
    assert_eq!(record["user_agent"], "integration-test");

    // notification and tracking were queued, not run inline
    assert!(matches!(app.side_effects.try_recv(), Ok(SideEffect::Notify(_))));
    assert!(matches!(app.side_effects.try_recv(), Ok(SideEffect::Track(_))));
}

#[tokio::test]
async fn test_trailing_slash_submission() {
    let app = TestApp::new();
    let (status, _) = app.post("/api/contacts/", budi()).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_rejected_messages_not_persisted() {
    let app = TestApp::new();

    for len in [9, 1001] {
        let mut payload = budi();
        payload["message"] = json!("x".repeat(len));
        let (status, body) = app.post("/api/contacts", payload).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["field"], "message");
    }

    let (_, listed) = app.get("/api/contacts").await;
    assert_eq!(listed["total"], 0);
}

#[tokio::test]
async fn test_boundary_message_lengths_accepted() {
    let app = TestApp::new();
    for len in [10, 1000] {
        let mut payload = budi();
        payload["message"] = json!("x".repeat(len));
        let (status, _) = app.post("/api/contacts", payload).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, listed) = app.get("/api/contacts").await;
    assert_eq!(listed["total"], 2);
}

#[tokio::test]
async fn test_missing_or_mistyped_field_names_the_field() {
    let app = TestApp::new();

    let mut payload = budi();
    payload.as_object_mut().unwrap().remove("message");
    let (status, body) = app.post("/api/contacts", payload).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["field"], "message");

    let mut payload = budi();
    payload["message"] = json!(12345);
    let (status, body) = app.post("/api/contacts", payload).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "message");

    let (status, body) = app.post("/api/contacts", json!({ "name": "Budi" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "email");

    let (_, listed) = app.get("/api/contacts").await;
    assert_eq!(listed["total"], 0);
}

#[tokio::test]
async fn test_non_json_body_is_bad_request() {
    let app = TestApp::new();
    let (status, body) = app
        .call_raw(Method::POST, "/api/contacts", Bytes::from_static(b"name=Budi"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_status_updates() {
    let app = TestApp::new();
    let (_, created) = app.post("/api/contacts", budi()).await;
    let id = created["id"].as_str().unwrap().to_string();

    for status in ["new", "contacted", "qualified", "closed"] {
        let uri = format!("/api/contacts/{}/status?status={}", id, status);
        let (code, body) = app.call(Method::PATCH, &uri, None).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    let (code, body) = app
        .call(
            Method::PATCH,
            &format!("/api/contacts/{}/status", id),
            Some(json!({ "status": "bogus" })),
        )
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_state");

    let (_, listed) = app.get("/api/contacts").await;
    assert_eq!(listed["contacts"][0]["status"], "closed");

    let (code, _) = app
        .call(Method::PATCH, "/api/contacts/nope/status?status=closed", None)
        .await;
    assert_eq!(code, StatusCode::NOT_FOUND);

    let (code, _) = app
        .call(Method::PATCH, &format!("/api/contacts/{}/status", id), None)
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_filter_and_paging() {
    let app = TestApp::new();
    for _ in 0..3 {
        app.post("/api/contacts", budi()).await;
        app.clock.advance(Duration::minutes(1));
    }

    let (_, page) = app.get("/api/contacts?limit=2&offset=0").await;
    assert_eq!(page["total"], 3);
    assert_eq!(page["contacts"].as_array().unwrap().len(), 2);

    let (_, closed) = app.get("/api/contacts?status=closed").await;
    assert_eq!(closed["total"], 0);

    let (code, _) = app.get("/api/contacts?status=bogus").await;
    assert_eq!(code, StatusCode::BAD_REQUEST);

    let (code, _) = app.get("/api/contacts?limit=abc").await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_contact_stats_shape() {
    let app = TestApp::new();
    app.post("/api/contacts", budi()).await;

    let (code, stats) = app.get("/api/contacts/stats").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(stats["totalSubmissions"], 1);
    assert_eq!(stats["byService"][0], json!({ "service": "ERP", "count": 1 }));
    assert_eq!(stats["byMonth"][0], json!({ "year": 2024, "month": 6, "count": 1 }));
}

#[tokio::test]
async fn test_empty_store_serves_default_catalog() {
    let app = TestApp::new();

    for (uri, key, count) in [
        ("/api/services", "services", 6),
        ("/api/products", "products", 4),
        ("/api/projects", "projects", 3),
    ] {
        let (code, body) = app.get(uri).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body[key].as_array().unwrap().len(), count);
        assert_eq!(body["total"], count);
        assert_eq!(body["source"], "default");
    }

    let (_, products) = app.get("/api/products").await;
    assert_eq!(products["products"][0]["features"][0], "Automated salary calculations");
    assert_eq!(products["products"][1]["features"][0]["icon"], "Eye");
}

#[tokio::test]
async fn test_failing_store_degrades_catalog() {
    let app = TestApp::with_store(Arc::new(FailingStore));

    let (code, body) = app.get("/api/services").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["total"], 6);
    assert_eq!(body["source"], "degraded");

    let (code, body) = app.post("/api/contacts", budi()).await;
    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "store_error");
    assert_eq!(
        body["message"],
        "Terjadi kesalahan sistem. Silakan coba lagi atau hubungi kami langsung."
    );

    let (code, _) = app.get("/api/analytics/dashboard").await;
    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);

    // recording stays successful even with the store down
    let (code, body) = app
        .post("/api/analytics/page-view", json!({ "type": "page_view", "page": "/" }))
        .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_page_views_and_dashboard() {
    let app = TestApp::new();
    let view = json!({ "type": "page_view", "page": "/services", "metadata": { "ref": "google" } });

    let (_, before) = app.get("/api/analytics/dashboard").await;
    assert_eq!(before["total_page_views"], 0);

    app.post("/api/analytics/page-view", view.clone()).await;
    app.post("/api/analytics/page-view", view).await;
    app.post("/api/contacts", budi()).await;

    let (code, dashboard) = app.get("/api/analytics/dashboard").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(dashboard["total_page_views"], 2);
    assert_eq!(dashboard["total_contacts"], 1);
    assert_eq!(dashboard["top_pages"][0], json!({ "page": "/services", "views": 2 }));
    assert_eq!(dashboard["contacts_by_service"][0], json!({ "service": "ERP", "count": 1 }));
    assert_eq!(dashboard["recent_activity"][0]["metadata"]["ref"], "google");
    assert_eq!(dashboard["recent_activity"][0]["ip_address"], "203.0.113.7");
}

#[tokio::test]
async fn test_page_view_never_rejected() {
    let app = TestApp::new();

    let (code, body) = app
        .post("/api/analytics/page-view", json!({ "type": "page_view" }))
        .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (code, body) = app
        .post("/api/analytics/page-view", json!({ "type": 3, "page": "/about" }))
        .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (code, body) = app
        .call_raw(Method::POST, "/api/analytics/page-view", Bytes::from_static(b"not json"))
        .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["success"], false);

    let (_, dashboard) = app.get("/api/analytics/dashboard").await;
    assert_eq!(dashboard["total_page_views"], 2);
    let pages: Vec<_> = dashboard["top_pages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["page"].as_str().unwrap().to_string())
        .collect();
    assert!(pages.contains(&"unknown".to_string()));
    assert!(pages.contains(&"/about".to_string()));
}

#[tokio::test]
async fn test_page_view_keeps_representable_metadata() {
    let app = TestApp::new();
    let view = json!({
        "type": "page_view",
        "page": "/",
        "metadata": { "n": u64::MAX, "ref": "google" }
    });

    let (code, _) = app.post("/api/analytics/page-view", view).await;
    assert_eq!(code, StatusCode::OK);

    let (_, dashboard) = app.get("/api/analytics/dashboard").await;
    let metadata = &dashboard["recent_activity"][0]["metadata"];
    assert_eq!(metadata["ref"], "google");
    assert!(metadata.get("n").is_none());
}

#[tokio::test]
async fn test_dashboard_window() {
    let app = TestApp::new();
    let now = app.clock.now();
    let view = json!({ "type": "page_view", "page": "/" });

    app.clock.set(now - Duration::days(31));
    app.post("/api/analytics/page-view", view.clone()).await;
    app.clock.set(now - Duration::days(29));
    app.post("/api/analytics/page-view", view).await;
    app.clock.set(now);

    let (_, dashboard) = app.get("/api/analytics/dashboard").await;
    assert_eq!(dashboard["total_page_views"], 1);
}

#[tokio::test]
async fn test_health_root_preflight_and_unknown() {
    let app = TestApp::new();

    let (code, health) = app.get("/api/health").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["service"], "Mabratech API");
    assert_eq!(health["store"], "memory");

    let (code, root) = app.get("/api/").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(root["message"], "Welcome to Mabratech API");

    let (code, _) = app.call(Method::OPTIONS, "/api/contacts", None).await;
    assert_eq!(code, StatusCode::NO_CONTENT);

    let (code, body) = app.get("/api/nothing-here").await;
    assert_eq!(code, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_oversized_phone_and_bad_email_rejected() {
    let app = TestApp::new();

    let mut payload = budi();
    payload["phone"] = json!("0".repeat(21));
    let (code, body) = app.post("/api/contacts", payload).await;
    assert_eq!(code, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "phone");

    let mut payload = budi();
    payload["email"] = json!("not-an-email");
    let (code, body) = app.post("/api/contacts", payload).await;
    assert_eq!(code, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "email");
}
