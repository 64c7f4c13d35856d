//! Tests for the liveness and readiness health checks

use crate::fluent::tests::*;
use crate::{Config, FluentRouter, HttpMiddleware, HttpRateLimitConfig, X_REQUEST_ID};
use axum::http::StatusCode;
use std::time::Duration;
use tower::ServiceExt;

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(get_request(uri)).await.unwrap();
    let status = response.status();
    let body = get_body_string(response).await;
    (status, serde_json::from_str(&body).unwrap())
}

#[tokio::test]
async fn test_liveness_reports_uptime() {
    let (status, body) = get_json(create_test_router(create_test_config()), "/live").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["alive"], true);
    assert!(body["uptime"].as_f64().unwrap() >= 0.0);
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_readiness_before_shutdown() {
    let (status, body) = get_json(create_test_router(create_test_config()), "/ready").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "ready": true }));
}

#[tokio::test]
async fn test_readiness_withdrawn_on_shutdown() {
    let router = FluentRouter::without_state(create_test_config())
        .unwrap()
        .merge(test_routes())
        .setup_middleware()
        .unwrap();
    router.lifecycle.begin_shutdown();
    let app = router.into_inner();

    let (status, body) = get_json(app.clone(), "/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, serde_json::json!({ "ready": false }));

    let (status, body) = get_json(app, "/live").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["alive"], false);
}

#[tokio::test]
async fn test_liveness_readiness_individual_control() {
    let config = Config::default().with_included_middlewares(vec![HttpMiddleware::Liveness]);
    let app = FluentRouter::without_state(config)
        .unwrap()
        .setup_liveness_readiness()
        .into_inner();

    let response = app.clone().oneshot(get_request("/live")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get_request("/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_checks_use_configured_paths() {
    let config = create_test_config()
        .with_liveness_route("/health")
        .with_readiness_route("/health/ready");
    let app = create_test_router(config);

    let (status, _) = get_json(app.clone(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get_json(app.clone(), "/health/ready").await;
    assert_eq!(status, StatusCode::OK);

    let response = app.oneshot(get_request("/live")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_checks_are_not_rate_limited() {
    let config = create_test_config().with_rate_limit_config(
        HttpRateLimitConfig::default()
            .with_window(Duration::from_secs(60))
            .with_max(1),
    );
    let app = create_test_router(config);

    let response = app.clone().oneshot(get_request("/items")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.clone().oneshot(get_request("/items")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    for uri in ["/live", "/ready", "/live"] {
        let response = app.clone().oneshot(get_request(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri} should bypass the limiter");
        // Still inside the request context and the outer gates
        assert!(response.headers().get(X_REQUEST_ID).is_some());
    }
}

#[tokio::test]
async fn test_health_check_with_other_method_is_not_found() {
    let app = create_test_router(create_test_config());
    let response = app.oneshot(post_request("/ready")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        get_error_response(response).await.message,
        "Route not found — No route matches POST /ready."
    );
}
