//! Form-submission pass-through tests

use axum::body::Body;
use axum::http::{Request, StatusCode};
use prayas_common::db::{collections, connect_in_memory, DocumentStore};
use prayas_forms::{build_router, AppState};
use serde_json::{json, Value};
use tower::util::ServiceExt;

async fn setup() -> (axum::Router, DocumentStore) {
    let store = DocumentStore::new(connect_in_memory().await.unwrap());
    let app = build_router(AppState { store: store.clone() });
    (app, store)
}

fn post_submit(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/submit")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn submission_is_stored_verbatim() {
    let (app, store) = setup().await;

    let payload = json!({
        "name": "Kiran",
        "phone": "9876543210",
        "course": "Class 11 PCM",
        "message": "Please call back"
    });
    let response = app.oneshot(post_submit(&payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "Form submitted successfully");

    let docs = store.list(collections::FORM_SUBMISSIONS).await.unwrap();
    assert_eq!(docs.len(), 1);
    // Verbatim: no schema validation, no field rewriting
    assert_eq!(docs[0].1, payload);
}

#[tokio::test]
async fn arbitrary_shapes_pass_through_unvalidated() {
    let (app, store) = setup().await;

    let payload = json!({ "anything": [1, 2, {"nested": true}] });
    let response = app.oneshot(post_submit(&payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.count(collections::FORM_SUBMISSIONS).await.unwrap(), 1);
}

#[tokio::test]
async fn health_reports_module_name() {
    let (app, _store) = setup().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["module"], "prayas-forms");
}
