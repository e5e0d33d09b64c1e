//! Integration tests for the admin console API
//!
//! Exercises routing, validation rejections, the auth middleware, the
//! missing-index warning banner, and the destructive-op confirmation.

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use helpers::{signed_in_token, test_state, FakeObjectStore};
use prayas_common::db::collections;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, token: Option<uuid::Uuid>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("user-agent", "Mozilla/5.0 (X11; Linux x86_64) Chrome/126.0");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.expect("read body");
    serde_json::from_slice(&bytes).expect("parse JSON")
}

fn image_record() -> Value {
    json!({
        "url": "https://cdn.test/events/x.jpg",
        "path": "events/x.jpg",
        "name": "x.jpg",
        "contentType": "image/jpeg",
        "isLocalFallback": false,
        "isExternalUrl": false,
        "uploadedAt": "2026-08-01T00:00:00Z"
    })
}

fn event_payload(title: &str, date: &str, images: Vec<Value>) -> Value {
    json!({ "title": title, "date": date, "images": images })
}

#[tokio::test]
async fn health_endpoint_needs_no_auth() {
    let state = test_state(FakeObjectStore::default()).await;
    let app = prayas_admin::build_router(state);

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "prayas-admin");
}

#[tokio::test]
async fn mutating_routes_require_a_session() {
    let state = test_state(FakeObjectStore::default()).await;
    let app = prayas_admin::build_router(state);

    let response = app
        .oneshot(post_json(
            "/api/events",
            None,
            event_payload("Annual Day", "14 Aug 2026", vec![image_record()]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn event_without_images_is_rejected_and_not_written() {
    let state = test_state(FakeObjectStore::default()).await;
    let store = state.store.clone();
    let token = signed_in_token(&state);
    let app = prayas_admin::build_router(state);

    let response = app
        .oneshot(post_json(
            "/api/events",
            Some(token),
            event_payload("Annual Day", "14 Aug 2026", vec![]),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.count(collections::EVENTS).await.unwrap(), 0, "no write may occur");
}

#[tokio::test]
async fn event_with_blank_title_or_date_is_rejected() {
    let state = test_state(FakeObjectStore::default()).await;
    let token = signed_in_token(&state);
    let app = prayas_admin::build_router(state);

    for payload in [
        event_payload("   ", "14 Aug 2026", vec![image_record()]),
        event_payload("Annual Day", "", vec![image_record()]),
    ] {
        let response = app
            .clone()
            .oneshot(post_json("/api/events", Some(token), payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn created_event_mirrors_cover_image_and_lists_newest_first() {
    let state = test_state(FakeObjectStore::default()).await;
    let token = signed_in_token(&state);
    let app = prayas_admin::build_router(state);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/events",
            Some(token),
            event_payload("Annual Day", "14 Aug 2026", vec![image_record()]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = extract_json(response.into_body()).await;
    assert_eq!(created["image"], "https://cdn.test/events/x.jpg");

    let response = app.oneshot(get("/api/events")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["events"].as_array().unwrap().len(), 1);
    assert_eq!(body["events"][0]["title"], "Annual Day");
}

#[tokio::test]
async fn sign_in_issues_a_usable_token() {
    let state = test_state(FakeObjectStore::default()).await;
    let app = prayas_admin::build_router(state);

    // Wrong password first
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/signin",
            None,
            json!({ "email": "admin@prayas.example", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/signin",
            None,
            json!({ "email": "admin@prayas.example", "password": "secret123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    let token: uuid::Uuid = body["token"].as_str().unwrap().parse().unwrap();
    // No roster entry for this email: signs in as a plain viewer
    assert_eq!(body["role"], "viewer");

    let response = app
        .oneshot(post_json(
            "/api/events",
            Some(token),
            event_payload("Annual Day", "14 Aug 2026", vec![image_record()]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn tests_listing_flags_missing_composite_index() {
    let state = test_state(FakeObjectStore::default()).await;
    let store = state.store.clone();
    store
        .put(
            collections::TESTS,
            "t1",
            &json!({
                "id": "t1", "title": "Unit Test 1", "class": "Class 9",
                "subject": "Math", "testDate": "2026-09-01",
                "status": "scheduled", "createdAt": "2026-08-01T00:00:00Z"
            }),
        )
        .await
        .unwrap();
    let app = prayas_admin::build_router(state);

    let response = app.clone().oneshot(get("/api/tests?status=scheduled")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert!(body["warning"].is_null(), "index present: no banner");

    sqlx::query("DROP INDEX idx_documents_status_test_date")
        .execute(store.pool())
        .await
        .unwrap();

    let response = app.oneshot(get("/api/tests?status=scheduled")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK, "degrade, don't fail");
    let body = extract_json(response.into_body()).await;
    assert!(body["warning"].as_str().unwrap().contains("index"));
    assert_eq!(body["tests"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn delete_all_requires_explicit_confirmation() {
    let state = test_state(FakeObjectStore::default()).await;
    let token = signed_in_token(&state);
    let app = prayas_admin::build_router(state);

    let response = app
        .clone()
        .oneshot(post_json("/api/results/delete-all", Some(token), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(post_json(
            "/api/results/delete-all",
            Some(token),
            json!({ "confirm": true }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["deleted"], 0);
    assert_eq!(body["message"], "Nothing to delete");
}

#[tokio::test]
async fn upload_route_returns_the_record_for_the_event_draft() {
    let state = test_state(FakeObjectStore::default()).await;
    let token = signed_in_token(&state);
    let app = prayas_admin::build_router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/api/images?name=banner.jpg")
        .header("content-type", "image/jpeg")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(vec![0u8; 512]))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["outcome"], "uploaded");
    assert!(body["record"]["path"].as_str().unwrap().starts_with("events/"));

    // Non-image body is rejected per-item, not as an HTTP failure
    let request = Request::builder()
        .method("POST")
        .uri("/api/images?name=notes.pdf")
        .header("content-type", "application/pdf")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(vec![0u8; 512]))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["outcome"], "rejected");
    assert!(body["record"].is_null());
}

#[tokio::test]
async fn from_urls_route_reports_records_and_failures() {
    let state = test_state(FakeObjectStore::default()).await;
    let token = signed_in_token(&state);
    let app = prayas_admin::build_router(state);

    let response = app
        .oneshot(post_json(
            "/api/images/from-urls",
            Some(token),
            json!({ "urls": "https://cdn.example/a.png\nnot a url" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["records"].as_array().unwrap().len(), 1);
    assert_eq!(body["failures"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn event_writes_append_audit_entries() {
    let state = test_state(FakeObjectStore::default()).await;
    let store = state.store.clone();
    let token = signed_in_token(&state);
    let app = prayas_admin::build_router(state);

    let response = app
        .oneshot(post_json(
            "/api/events",
            Some(token),
            event_payload("Annual Day", "14 Aug 2026", vec![image_record()]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // The audit append is fire-and-forget; give the writer a moment
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    let logs = collections::recent_logs(&store, 10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].actor, "Test Admin");
    assert_eq!(logs[0].browser_family, "Chrome");
    assert!(logs[0].action.contains("Annual Day"));
}
