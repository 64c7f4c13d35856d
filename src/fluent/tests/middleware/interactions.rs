//! Integration tests for gate interactions
//!
//! These tests send requests that violate more than one rule and check that
//! the gate closest to the client answers, following the pipeline order.

use crate::fluent::tests::*;
use crate::{HttpHeaderLimitsConfig, HttpMethodWhitelistConfig, HttpRateLimitConfig, X_REQUEST_ID};
use axum::http::{Method, StatusCode, header::ACCESS_CONTROL_ALLOW_ORIGIN};
use tower::ServiceExt;

// ============================================================================
// Header limits run before the sanitizer
// ============================================================================

#[tokio::test]
async fn test_header_count_checked_before_sanitizer() {
    let config = create_test_config()
        .with_header_limits(HttpHeaderLimitsConfig::default().with_max_header_count(3));
    let response = create_test_router(config)
        .oneshot(
            Request::builder()
                .uri("/items")
                .header("x-forwarded-for", "10.0.0.1")
                .header("accept", "*/*")
                .header("user-agent", "test")
                .header("referer", "https://a.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE);
}

// ============================================================================
// Sanitizer runs before the Content-Type gate
// ============================================================================

#[tokio::test]
async fn test_sanitizer_before_content_type() {
    let response = create_test_router(create_test_config())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/items")
                .header("via", "proxy")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Method whitelist runs before header and body gates
// ============================================================================

#[tokio::test]
async fn test_method_whitelist_before_content_type() {
    let config = create_test_config().with_method_whitelist(
        HttpMethodWhitelistConfig::default().with_allowed(vec![Method::GET]),
    );
    let response = create_test_router(config)
        .oneshot(post_request("/items"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// ============================================================================
// Rate limiter counts rejected requests of later gates
// ============================================================================

#[tokio::test]
async fn test_rate_limit_before_method_whitelist() {
    let config = create_test_config()
        .with_rate_limit_config(HttpRateLimitConfig::default().with_max(1))
        .with_method_whitelist(
            HttpMethodWhitelistConfig::default().with_allowed(vec![Method::GET]),
        );
    let app = create_test_router(config);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/items", "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = app.oneshot(get_request("/items")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

// ============================================================================
// CORS answers preflights before the rate limiter and method whitelist
// ============================================================================

#[tokio::test]
async fn test_preflight_not_rate_limited() {
    let config = create_test_config()
        .with_rate_limit_config(HttpRateLimitConfig::default().with_max(1));
    let app = create_test_router(config);

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(options_request("/items", "https://a.example", "POST"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}

#[tokio::test]
async fn test_cors_headers_on_rejected_request() {
    let response = create_test_router(create_test_config())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/items")
                .header("Origin", "https://a.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
}

// ============================================================================
// Outer gates decorate every rejection
// ============================================================================

#[tokio::test]
async fn test_rejections_carry_request_id_and_security_headers() {
    let response = create_test_router(create_test_config())
        .oneshot(
            Request::builder()
                .uri("/items")
                .header("te", "trailers")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get(X_REQUEST_ID).is_some());
    assert_eq!(response.headers().get("x-content-type-options").unwrap(), "nosniff");
}
