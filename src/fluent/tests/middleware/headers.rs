//! Tests for the header limiter and header sanitizer gates

use crate::fluent::tests::*;
use crate::{FluentRouter, HttpHeaderLimitsConfig, HttpHeaderSanitizerConfig};
use axum::{http::StatusCode, routing::get};
use tower::ServiceExt;

fn many_headers(count: usize) -> Request<Body> {
    let mut builder = Request::builder().uri("/items");
    for i in 0..count {
        builder = builder.header(format!("x-custom-{i}"), "1");
    }
    builder.body(Body::empty()).unwrap()
}

/// Echoes the names of the headers the handler received.
fn header_echo_router(config: crate::Config) -> Router {
    FluentRouter::without_state(config)
        .unwrap()
        .route(
            "/headers",
            get(|headers: axum::http::HeaderMap| async move {
                let mut names: Vec<_> = headers.keys().map(|k| k.as_str().to_string()).collect();
                names.sort();
                names.join(",")
            }),
        )
        .setup_middleware()
        .unwrap()
        .into_inner()
}

// ============================================================================
// Header limits
// ============================================================================

#[tokio::test]
async fn test_too_many_headers() {
    let config = create_test_config()
        .with_header_limits(HttpHeaderLimitsConfig::default().with_max_header_count(10));
    let response = create_test_router(config)
        .oneshot(many_headers(11))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE);
    assert_eq!(
        get_error_response(response).await.message,
        "Too many headers (limit = 10)."
    );
}

#[tokio::test]
async fn test_oversized_single_header() {
    let response = create_test_router(create_test_config())
        .oneshot(
            Request::builder()
                .uri("/items")
                .header("user-agent", "x".repeat(5000))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE);
    assert_eq!(
        get_error_response(response).await.message,
        "Header exceeds per-header size limit (4096 bytes)."
    );
}

#[tokio::test]
async fn test_total_header_size() {
    let response = create_test_router(create_test_config())
        .oneshot(
            Request::builder()
                .uri("/items")
                .header("user-agent", "x".repeat(3000))
                .header("accept", "x".repeat(3000))
                .header("referer", "x".repeat(3000))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE);
    assert_eq!(
        get_error_response(response).await.message,
        "Total header size exceeds limit (8192 bytes)."
    );
}

#[tokio::test]
async fn test_chunked_rejected() {
    let response = create_test_router(create_test_config())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/items")
                .header("Content-Type", "application/json")
                .header("Transfer-Encoding", "chunked")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(
        get_error_response(response).await.message,
        "Chunked request bodies are not allowed."
    );
}

// ============================================================================
// Header sanitizer
// ============================================================================

#[tokio::test]
async fn test_blocked_header_rejected() {
    let response = create_test_router(create_test_config())
        .oneshot(
            Request::builder()
                .uri("/items")
                .header("X-Forwarded-For", "10.0.0.1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        get_error_response(response).await.message,
        "Header 'x-forwarded-for' is not allowed."
    );
}

#[tokio::test]
async fn test_duplicate_header_rejected() {
    let response = create_test_router(create_test_config())
        .oneshot(
            Request::builder()
                .uri("/items")
                .header("accept", "text/plain")
                .header("accept", "application/json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        get_error_response(response).await.message,
        "Duplicate header 'accept' is not permitted."
    );
}

#[tokio::test]
async fn test_unknown_headers_dropped_before_handler() {
    let response = header_echo_router(create_test_config())
        .oneshot(
            Request::builder()
                .uri("/headers")
                .header("accept", "*/*")
                .header("x-tracking", "abc")
                .header("user-agent", "test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get_body_string(response).await, "accept,user-agent");
}

#[tokio::test]
async fn test_allowlist_is_configurable() {
    let config = create_test_config().with_header_sanitizer(
        HttpHeaderSanitizerConfig::default().with_allowed_headers(["x-tracking"]),
    );
    let response = header_echo_router(config)
        .oneshot(
            Request::builder()
                .uri("/headers")
                .header("x-tracking", "abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(get_body_string(response).await, "x-tracking");
}
