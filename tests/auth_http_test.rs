//! HTTP-level integration tests for the API key middleware.
//!
//! These tests drive the real router and verify that:
//! - requests without a usable `Authorization: ApiKey <key>` header are
//!   rejected with 401 before any handler runs
//! - missing and malformed headers stay distinguishable in the error body
//! - a valid key lets the event routes do their job
//!
//! Header parsing itself is covered by unit tests in the auth module.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use tower::ServiceExt;

use eventsink::auth::ApiKey;
use eventsink::routes::{self, AppState};
use eventsink::storage::FileSystemStorage;

const TEST_KEY: &str = "test-key-123";

async fn test_app() -> (tempfile::TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileSystemStorage::new(dir.path()).await.unwrap();
    let app = routes::app(
        AppState { storage },
        ApiKey(TEST_KEY.to_string()),
        1024 * 1024,
    );
    (dir, app)
}

fn get_events(auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri("/api/events");
    if let Some(value) = auth {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn health_needs_no_auth() {
    let (_dir, app) = test_app().await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_auth_header_is_rejected() {
    let (_dir, app) = test_app().await;

    let response = app.oneshot(get_events(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_string(response).await;
    assert!(body.contains("no authorization header included"), "body: {body}");
}

#[tokio::test]
async fn empty_auth_header_is_rejected_as_missing() {
    let (_dir, app) = test_app().await;

    let response = app.oneshot(get_events(Some(""))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_string(response).await;
    assert!(body.contains("no authorization header included"), "body: {body}");
}

#[tokio::test]
async fn bearer_scheme_is_rejected_as_malformed() {
    let (_dir, app) = test_app().await;

    let response = app.oneshot(get_events(Some("Bearer token"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_string(response).await;
    assert!(body.contains("malformed authorization header"), "body: {body}");
}

#[tokio::test]
async fn scheme_without_key_is_rejected_as_malformed() {
    let (_dir, app) = test_app().await;

    let response = app.oneshot(get_events(Some("ApiKey"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_string(response).await;
    assert!(body.contains("malformed authorization header"), "body: {body}");
}

#[tokio::test]
async fn wrong_key_is_rejected() {
    let (_dir, app) = test_app().await;

    let response = app
        .oneshot(get_events(Some("ApiKey not-the-key")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_string(response).await;
    assert!(body.contains("invalid API key"), "body: {body}");
}

#[tokio::test]
async fn valid_key_passes_the_middleware() {
    let (_dir, app) = test_app().await;

    let response = app
        .oneshot(get_events(Some(&format!("ApiKey {TEST_KEY}"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn ingest_fetch_delete_round_trip() {
    let (_dir, app) = test_app().await;
    let auth = format!("ApiKey {TEST_KEY}");

    let request = Request::builder()
        .method("POST")
        .uri("/api/events")
        .header(header::AUTHORIZATION, &auth)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"type":"deploy","service":"api"}"#))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let created: serde_json::Value =
        serde_json::from_str(&body_string(response).await).unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    let request = Request::builder()
        .method("GET")
        .uri(format!("/api/events/{id}"))
        .header(header::AUTHORIZATION, &auth)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let payload: serde_json::Value =
        serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(payload["type"], "deploy");
    assert_eq!(payload["service"], "api");

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/events/{id}"))
        .header(header::AUTHORIZATION, &auth)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let request = Request::builder()
        .method("GET")
        .uri(format!("/api/events/{id}"))
        .header(header::AUTHORIZATION, &auth)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ingest_rejects_events_without_a_type() {
    let (_dir, app) = test_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/events")
        .header(header::AUTHORIZATION, format!("ApiKey {TEST_KEY}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"service":"api"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
