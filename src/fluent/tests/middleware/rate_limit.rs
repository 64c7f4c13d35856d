//! Tests for the sliding-window rate limiter
//!
//! `oneshot()` requests carry no `ConnectInfo`, so they all share one key.
//! Per-IP behavior is covered by `tests/rate_limit_tests.rs` against a real server.

use crate::fluent::tests::*;
use crate::{FluentRouter, HttpMiddleware, HttpRateLimitConfig};
use axum::http::{StatusCode, header::RETRY_AFTER};
use std::time::Duration;
use tower::ServiceExt;

#[tokio::test]
async fn test_request_over_max_gets_429() {
    let config = create_test_config().with_rate_limit_config(
        HttpRateLimitConfig::default()
            .with_window(Duration::from_secs(60))
            .with_max(200),
    );
    let app = create_test_router(config);

    for i in 0..200 {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/items", "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "request {i} should pass");
    }

    let response = app
        .oneshot(json_request("POST", "/items", "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers().get(RETRY_AFTER).unwrap(), "60");
    assert_eq!(
        get_error_response(response).await.message,
        "Too many requests — limit is 200 per 60s."
    );
}

#[tokio::test]
async fn test_window_expiry_readmits() {
    let config = create_test_config().with_rate_limit_config(
        HttpRateLimitConfig::default()
            .with_window(Duration::from_millis(200))
            .with_max(1),
    );
    let app = create_test_router(config);

    let response = app.clone().oneshot(get_request("/items")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.clone().oneshot(get_request("/items")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    // Retry-After is rounded up to whole seconds
    assert_eq!(response.headers().get(RETRY_AFTER).unwrap(), "1");

    tokio::time::sleep(Duration::from_millis(450)).await;
    let response = app.oneshot(get_request("/items")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_custom_key_separates_clients() {
    let config = create_test_config()
        .with_rate_limit_config(HttpRateLimitConfig::default().with_max(1))
        .with_header_sanitizer(
            crate::HttpHeaderSanitizerConfig::default().with_allowed_headers(["x-client"]),
        );
    let app = FluentRouter::without_state(config)
        .unwrap()
        .merge(test_routes())
        .with_rate_limit_key(|req| {
            req.headers()
                .get("x-client")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("anonymous")
                .to_string()
        })
        .setup_middleware()
        .unwrap()
        .into_inner();

    let client = |name: &str| {
        Request::builder()
            .uri("/items")
            .header("x-client", name)
            .body(Body::empty())
            .unwrap()
    };

    assert_eq!(app.clone().oneshot(client("a")).await.unwrap().status(), StatusCode::OK);
    assert_eq!(app.clone().oneshot(client("b")).await.unwrap().status(), StatusCode::OK);
    assert_eq!(
        app.oneshot(client("a")).await.unwrap().status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn test_zero_max_disables_limiter() {
    let config = create_test_config()
        .with_rate_limit_config(HttpRateLimitConfig::default().with_max(0));
    let app = create_test_router(config);

    for _ in 0..5 {
        let response = app.clone().oneshot(get_request("/items")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_excluded_limiter_starts_no_cleanup_task() {
    let config = create_test_config()
        .with_rate_limit_config(HttpRateLimitConfig::default().with_max(1))
        .with_excluded_middlewares(vec![HttpMiddleware::RateLimiting]);
    let router = FluentRouter::without_state(config)
        .unwrap()
        .setup_rate_limiting();
    assert!(router.rate_limit_cleanup.is_none());
}

#[test]
fn test_setup_outside_runtime_still_limits() {
    let config = create_test_config()
        .with_rate_limit_config(HttpRateLimitConfig::default().with_max(1));
    let router = FluentRouter::without_state(config)
        .unwrap()
        .merge(test_routes())
        .setup_rate_limiting();
    assert!(router.rate_limit_cleanup.is_none());

    let app = router.into_inner();
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    rt.block_on(async {
        assert_eq!(app.clone().oneshot(get_request("/items")).await.unwrap().status(), StatusCode::OK);
        assert_eq!(
            app.oneshot(get_request("/items")).await.unwrap().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    });
}
