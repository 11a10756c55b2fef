//! The admission middleware in front of an Axum router.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{header, Request, StatusCode},
    middleware,
    response::Response,
    routing::{get, post},
    Router,
};
use tower::ServiceExt;

use admission_gate::config::{ClassRouteConfig, LimiterClassConfig};
use admission_gate::http::admission_middleware;
use admission_gate::{AdmissionGate, GateConfig};

mod common;

use common::{single_class, test_gate};

fn protected_app(gate: Arc<AdmissionGate>) -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/api/auth/login", post(|body: String| async move { body }))
        .layer(middleware::from_fn_with_state(gate, admission_middleware))
        .layer(MockConnectInfo(SocketAddr::from(([192, 0, 2, 10], 40000))))
}

fn get_from(identity: Option<&str>, uri: &str) -> Request<Body> {
    let mut builder = Request::builder().uri(uri).header(header::USER_AGENT, "Mozilla/5.0");
    if let Some(identity) = identity {
        builder = builder.header("x-forwarded-for", identity);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_from(identity: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("x-forwarded-for", identity)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_rate_limited_request_gets_429() {
    let t = test_gate(single_class(5, 60_000));
    let app = protected_app(t.gate.clone());

    for _ in 0..5 {
        let response = app.clone().oneshot(get_from(Some("203.0.113.5"), "/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.oneshot(get_from(Some("203.0.113.5"), "/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()[header::RETRY_AFTER], "60");
    assert_eq!(body_text(response).await, "Too many requests, please try again later");
}

#[tokio::test]
async fn test_threat_body_then_denylisted() {
    let t = test_gate(GateConfig::default());
    let app = protected_app(t.gate.clone());

    let attack = post_from("198.51.100.9", "/api/auth/login", r#"{"query": "'; DROP TABLE users; --"}"#);
    let response = app.clone().oneshot(attack).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.oneshot(get_from(Some("198.51.100.9"), "/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(response).await, "Access denied");
}

#[tokio::test]
async fn test_allowed_body_reaches_handler() {
    let t = test_gate(GateConfig::default());
    let app = protected_app(t.gate.clone());

    let payload = r#"{"user": "alice", "password": "hunter2"}"#;
    let response = app.oneshot(post_from("203.0.113.7", "/api/auth/login", payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, payload);
}

#[tokio::test]
async fn test_peer_address_is_fallback_identity() {
    let t = test_gate(single_class(1, 60_000));
    let app = protected_app(t.gate.clone());

    let response = app.clone().oneshot(get_from(None, "/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(t.gate.state().limiter.window("192.0.2.10", "general").is_some());

    let response = app.clone().oneshot(get_from(None, "/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // A forwarded identity has its own budget.
    let response = app.oneshot(get_from(Some("203.0.113.9"), "/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_class_routes_select_limiter() {
    let mut config = single_class(100, 60_000);
    config.limiter_classes.insert("auth".into(), LimiterClassConfig::new(1, 60_000));
    config.http.class_routes.push(ClassRouteConfig {
        path_prefix: "/api/auth".into(),
        class: "auth".into(),
    });
    let t = test_gate(config);
    let app = protected_app(t.gate.clone());

    let login = || post_from("203.0.113.5", "/api/auth/login", "user=alice");
    assert_eq!(app.clone().oneshot(login()).await.unwrap().status(), StatusCode::OK);
    assert_eq!(
        app.clone().oneshot(login()).await.unwrap().status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    let response = app.oneshot(get_from(Some("203.0.113.5"), "/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let mut config = single_class(100, 60_000);
    config.http.max_body_size = 16;
    let t = test_gate(config);
    let app = protected_app(t.gate.clone());

    let response = app
        .oneshot(post_from("203.0.113.5", "/api/auth/login", &"a".repeat(64)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    // Rejected before evaluation, so nothing was charged or recorded.
    assert!(t.events.is_empty());
}

#[tokio::test]
async fn test_form_encoded_body_is_decoded_before_scanning() {
    let t = test_gate(GateConfig::default());
    let app = protected_app(t.gate.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("x-forwarded-for", "203.0.113.5")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("user=alice&q=1+union+select+password+from+users"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let event = t.events.snapshot().pop().unwrap();
    assert_eq!(event.detail("pattern"), Some("union select"));
    assert_eq!(event.detail("location"), Some("body"));
}
