//! Test helpers and utilities for FluentRouter tests
//!
//! This module provides shared test infrastructure for all FluentRouter **unit tests**.
//! These tests use `oneshot()` for fast, in-process testing without network I/O.
//!
//! ## Test Organization
//!
//! - **Unit tests** (`src/fluent/tests/`): Fast, isolated tests using `oneshot()`
//! - **Integration tests** (`tests/`): Real server + network tests (rate limiting by client IP)
//!
//! Requests sent with `oneshot()` carry no `ConnectInfo`, so the rate limiter
//! counts all of them against the `unknown` client.
//!
//! ## Available Helpers
//!
//! - Configuration builders: `create_test_config()`, `create_config_with_toml()`
//! - Router builders: `create_test_router()`
//! - Request helpers: `get_request()`, `post_request()`, `json_request()`, `options_request()`
//! - Response helpers: `get_body_string()`, `get_error_response()`

use crate::{Config, ErrorResponse, FluentRouter};
use axum::{
    Router,
    body::{Body, Bytes},
    http::Request,
    response::Response,
    routing::{get, post},
};


// ============================================================================
// Configuration Helpers
// ============================================================================

/// Creates a test configuration from the defaults.
pub(crate) fn create_test_config() -> Config {
    Config::from_toml("").expect("Failed to parse empty test config")
}

/// Creates a test configuration with additional TOML sections injected.
///
/// # Example
/// ```ignore
/// let config = create_config_with_toml(r#"
/// [http.rate_limit]
/// max = 2
/// "#);
/// ```
pub(crate) fn create_config_with_toml(additional_toml: &str) -> Config {
    let toml_str = format!(
        r#"
[http]
bind_addr = "127.0.0.1"
bind_port = 3000
metrics_route = "/metrics"

{additional_toml}

[logging]
format = "json"
        "#
    );

    toml_str.parse().expect("Failed to parse test config TOML")
}

// ============================================================================
// Router Helpers
// ============================================================================

/// The routes every pipeline test runs against.
pub(crate) fn test_routes() -> Router {
    Router::new()
        .route("/items", get(|| async { "[]" }).post(echo_length))
        .route("/items/{id}", get(|| async { "{}" }).put(echo_length))
        .route("/uploads", post(echo_length))
        .route("/docs", get(|| async { "<html></html>" }))
}

/// Creates a router with the full pipeline installed in front of [`test_routes`].
pub(crate) fn create_test_router(config: Config) -> Router {
    FluentRouter::without_state(config)
        .expect("Failed to create FluentRouter")
        .merge(test_routes())
        .setup_middleware()
        .expect("Failed to setup middleware")
        .into_inner()
}

// ============================================================================
// Request Helpers
// ============================================================================

/// Creates a GET request to the specified URI.
#[allow(dead_code)]
pub(crate) fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Creates a POST request to the specified URI with an empty body.
#[allow(dead_code)]
pub(crate) fn post_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Creates a request with an `application/json` body.
#[allow(dead_code)]
pub(crate) fn json_request(method: &str, uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(body.into())
        .unwrap()
}

/// Creates an OPTIONS preflight request for CORS testing.
#[allow(dead_code)]
pub(crate) fn options_request(uri: &str, origin: &str, method: &str) -> Request<Body> {
    Request::builder()
        .method("OPTIONS")
        .uri(uri)
        .header("Origin", origin)
        .header("Access-Control-Request-Method", method)
        .body(Body::empty())
        .unwrap()
}

// ============================================================================
// Response Helpers
// ============================================================================

/// Extracts the body from a response as a String.
#[allow(dead_code)]
pub(crate) async fn get_body_string(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&body).to_string()
}

/// Parses the error envelope of a rejected request.
#[allow(dead_code)]
pub(crate) async fn get_error_response(response: Response) -> ErrorResponse {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).expect("Response body is not an error envelope")
}

// ============================================================================
// Test Handlers
// ============================================================================

/// Reads the whole body and answers with its length.
pub(crate) async fn echo_length(body: Bytes) -> String {
    body.len().to_string()
}
