//! Gateway Tests
//!
//! Drives the route table in-process with `tower::ServiceExt::oneshot`:
//! - session create and lookup over HTTP
//! - failure translation to status codes and flat messages
//! - readiness follows the store probe

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use matchmaker::http_server::build_router;
use matchmaker::sessions::SessionRepository;
use matchmaker::store::{MemoryPool, StorePool};

// =============================================================================
// Test Utilities
// =============================================================================

fn setup() -> (MemoryPool, Router) {
    let pool = MemoryPool::new();
    let shared: Arc<dyn StorePool> = Arc::new(pool.clone());
    let router = build_router(SessionRepository::new(Arc::clone(&shared)), shared);
    (pool, router)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn post_game(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/game")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// =============================================================================
// Sessions
// =============================================================================

#[tokio::test]
async fn test_create_then_get_session() {
    let (_pool, router) = setup();

    let (status, body) = send(
        &router,
        post_game(r#"{"id":"abc123","port":7777,"ip":"10.0.0.5"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let created: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(created, json!({"id": "abc123", "port": 7777, "ip": "10.0.0.5"}));

    let (status, body) = send(&router, get("/game/abc123")).await;
    assert_eq!(status, StatusCode::OK);
    let fetched: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_optional_fields_may_be_omitted() {
    let (_pool, router) = setup();

    let (status, _) = send(&router, post_game(r#"{"id":"bare"}"#)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&router, get("/game/bare")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"id":"bare"}"#);
}

#[tokio::test]
async fn test_missing_session_is_404_with_message() {
    let (_pool, router) = setup();

    let (status, body) = send(&router, get("/game/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        "Error getting session missing: Could not find the requested session"
    );
}

#[tokio::test]
async fn test_storage_failure_is_500_with_flat_message() {
    let (pool, router) = setup();
    pool.faults().fail_reads(true);

    let (status, body) = send(&router, get("/game/abc")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("Error getting session abc: Error getting hash for key Session:abc: "));
    assert!(!body.contains('\n'));
}

#[tokio::test]
async fn test_store_failure_on_create_is_500() {
    let (pool, router) = setup();
    pool.faults().fail_exec(true);

    let (status, body) = send(&router, post_game(r#"{"id":"x","port":1}"#)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("Error storing session: Could not save session to store"));
    assert_eq!(pool.checked_out(), 0);
}

#[tokio::test]
async fn test_invalid_bodies_are_400() {
    let (pool, router) = setup();

    let (status, body) = send(&router, post_game(r#"{"id":""}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Error storing session: session id must not be empty");

    let (status, body) = send(&router, post_game("not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with("Could not decode session: "));

    let (status, _) = send(&router, post_game(r#"{"id":"a","port":70000}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(pool.is_empty());
}

#[tokio::test]
async fn test_unknown_method_not_routed() {
    let (_pool, router) = setup();

    let request = Request::builder()
        .method("DELETE")
        .uri("/game/abc")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// Readiness
// =============================================================================

#[tokio::test]
async fn test_readiness_follows_store_probe() {
    let (pool, router) = setup();

    let (status, body) = send(&router, get("/readiness")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"ready"}"#);

    pool.faults().fail_ping(true);
    let (status, body) = send(&router, get("/readiness")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["status"], "unavailable");

    pool.faults().fail_ping(false);
    let (status, _) = send(&router, get("/readiness")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_readiness_ignores_session_data() {
    let (pool, router) = setup();

    send(&router, post_game(r#"{"id":"a"}"#)).await;
    pool.faults().fail_reads(true);
    pool.faults().fail_exec(true);

    let (status, _) = send(&router, get("/readiness")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pool.len(), 1);
}

#[tokio::test]
async fn test_health_reports_version() {
    let (pool, router) = setup();
    pool.faults().fail_ping(true);

    let (status, body) = send(&router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["status"], "ok");
    assert_eq!(value["version"], matchmaker::VERSION);
}
