//! HTTP endpoint tests against an in-process router

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use sr_core::config::RelayConfig;
use sr_core::error::ConnectionError;
use sr_core::SessionState;
use sr_protocol::RelayStatus;
use sr_relay::server::router;
use sr_relay::testing::{ConnectBehavior, FakeConnector};
use sr_relay::RelayState;

fn app(connector: Arc<FakeConnector>) -> (Arc<RelayState>, Router) {
    app_with_config(RelayConfig::default(), connector)
}

fn app_with_config(config: RelayConfig, connector: Arc<FakeConnector>) -> (Arc<RelayState>, Router) {
    let state = Arc::new(RelayState::new(config, connector));
    (Arc::clone(&state), router(state))
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn wait_for(state: &RelayState, target: SessionState) {
    let mut rx = state.sessions.subscribe();
    rx.wait_for(|s| s.state == target).await.unwrap();
}

#[tokio::test]
async fn test_set_config_connects() {
    let connector = FakeConnector::new();
    let (state, app) = app(Arc::clone(&connector));

    let response = app
        .oneshot(post_json(
            "/set-ssh-config",
            r#"{"host":"10.0.0.5","port":"22","username":"ops","password":"x"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.is_empty());

    wait_for(&state, SessionState::Ready).await;
    assert_eq!(connector.attempts(), 1);
    assert!(state.sessions.has_config());
}

#[tokio::test]
async fn test_set_config_empty_port_defaults() {
    let (state, app) = app(FakeConnector::new());

    let response = app
        .oneshot(post_json(
            "/set-ssh-config",
            r#"{"host":"10.0.0.5","port":"","username":"ops","credential":"x"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    wait_for(&state, SessionState::Ready).await;
}

#[tokio::test]
async fn test_set_config_rejects_malformed_body() {
    let connector = FakeConnector::new();
    let (state, app) = app(Arc::clone(&connector));

    let response = app
        .oneshot(post_json("/set-ssh-config", r#"{"host":"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!body_string(response).await.is_empty());
    assert_eq!(connector.attempts(), 0);
    assert!(!state.sessions.has_config());
}

#[tokio::test]
async fn test_set_config_rejects_missing_host() {
    let (state, app) = app(FakeConnector::new());

    let response = app
        .oneshot(post_json(
            "/set-ssh-config",
            r#"{"host":"  ","username":"ops","credential":"x"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response).await.contains("host is required"));
    assert_eq!(state.sessions.current_state(), SessionState::Disconnected);
}

#[tokio::test]
async fn test_set_config_rejects_bad_port() {
    let (_, app) = app(FakeConnector::new());

    let response = app
        .oneshot(post_json(
            "/set-ssh-config",
            r#"{"host":"10.0.0.5","port":"ssh","username":"ops","credential":"x"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_reports_failure() {
    let connector = FakeConnector::new();
    connector.set_behavior(ConnectBehavior::Fail(ConnectionError::AuthenticationFailed {
        username: "ops".to_string(),
    }));
    let (state, app) = app(connector);

    state
        .sessions
        .configure(sr_core::SessionConfig::new("10.0.0.5", 22, "ops", "wrong"));
    wait_for(&state, SessionState::Failed).await;

    let response = app
        .oneshot(Request::get("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let status: RelayStatus = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(status.state, SessionState::Failed);
    assert_eq!(status.generation, 1);
    assert!(status.configured);
    assert_eq!(status.clients, 0);
    assert!(status.error.is_some());
}

#[tokio::test]
async fn test_classify() {
    let (_, app) = app(FakeConnector::new());

    let response = app
        .oneshot(post_json(
            "/classify",
            r#"{"input":"listar /tmp","isError":false,"message":""}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let tokens: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(
        tokens,
        serde_json::json!([
            {"token": "listar", "category": "reserved_word", "isError": false},
            {"token": "/tmp", "category": "identifier", "isError": false}
        ])
    );
}

#[tokio::test]
async fn test_preflight_from_allowed_origin() {
    let (_, app) = app(FakeConnector::new());

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/set-ssh-config")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
}

#[tokio::test]
async fn test_no_cors_headers_for_unknown_origin() {
    let (_, app) = app(FakeConnector::new());

    let response = app
        .oneshot(
            Request::get("/status")
                .header(header::ORIGIN, "http://evil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_wildcard_origin_is_mirrored() {
    let config = RelayConfig {
        allowed_origins: vec!["*".to_string()],
        ..Default::default()
    };
    let (_, app) = app_with_config(config, FakeConnector::new());

    let response = app
        .oneshot(
            Request::get("/status")
                .header(header::ORIGIN, "http://10.0.0.9:8080")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://10.0.0.9:8080"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );
}
