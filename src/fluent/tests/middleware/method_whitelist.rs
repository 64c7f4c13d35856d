//! Tests for the method whitelist gate

use crate::fluent::tests::*;
use crate::HttpMethodWhitelistConfig;
use axum::http::{Method, StatusCode};
use tower::ServiceExt;

fn get_post_only() -> Router {
    let config = create_test_config().with_method_whitelist(
        HttpMethodWhitelistConfig::default().with_allowed(vec![Method::GET, Method::POST]),
    );
    create_test_router(config)
}

#[tokio::test]
async fn test_unlisted_method_rejected() {
    let response = get_post_only()
        .oneshot(json_request("PUT", "/items/1", "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        get_error_response(response).await.message,
        "HTTP method 'PUT' is not allowed. Allowed methods: GET, POST."
    );
}

#[tokio::test]
async fn test_head_always_passes() {
    let response = get_post_only()
        .oneshot(
            Request::builder()
                .method("HEAD")
                .uri("/items")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_listed_methods_pass() {
    let app = get_post_only();
    let response = app.clone().oneshot(get_request("/items")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request("POST", "/items", "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
