//! Tests for the Content-Type gate

use crate::fluent::tests::*;
use crate::{HttpContentTypeConfig, HttpMiddleware};
use axum::http::StatusCode;
use tower::ServiceExt;

#[tokio::test]
async fn test_get_with_content_type_rejected() {
    let response = create_test_router(create_test_config())
        .oneshot(
            Request::builder()
                .uri("/items")
                .header("Content-Type", "application/json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(
        get_error_response(response).await.message,
        "HTTP method 'GET' does not accept a request body."
    );
}

#[tokio::test]
async fn test_post_without_content_type_rejected() {
    let response = create_test_router(create_test_config())
        .oneshot(post_request("/items"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(
        get_error_response(response).await.message,
        "Missing Content-Type header."
    );
}

#[tokio::test]
async fn test_case_and_parameters_ignored() {
    let response = create_test_router(create_test_config())
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/items/7")
                .header("Content-Type", "Application/JSON; charset=UTF-8")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_route_override() {
    let config = create_test_config().with_content_type_config(
        HttpContentTypeConfig::default()
            .with_route_override("/uploads", vec!["multipart/form-data".into()]),
    );
    let app = create_test_router(config);

    let multipart = |uri: &str| {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "multipart/form-data; boundary=abc")
            .body(Body::from("--abc--"))
            .unwrap()
    };

    let response = app.clone().oneshot(multipart("/uploads")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(multipart("/items")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(
        get_error_response(response).await.message,
        "Content-Type 'multipart/form-data' is not allowed on this endpoint. Expected one of: application/json."
    );
}

#[tokio::test]
async fn test_excluded_gate_admits_anything() {
    let config = create_test_config().with_excluded_middlewares(vec![HttpMiddleware::ContentType]);
    let response = create_test_router(config)
        .oneshot(post_request("/items"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
