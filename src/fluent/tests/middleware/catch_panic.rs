//! Tests for panic catching middleware setup

use crate::fluent::tests::*;
use crate::{Config, FluentRouter, INTERNAL_ERROR_MESSAGE, X_REQUEST_ID};
use axum::{http::StatusCode, routing::get};
use tower::Service;

fn panic_router() -> Router {
    Router::new().route(
        "/panic",
        get(|| async {
            panic!("Test panic!");
            #[allow(unreachable_code)]
            "This will never be reached"
        }),
    )
}

#[tokio::test]
async fn test_setup_catch_panic_with_panic() {
    let fluent_router = FluentRouter::without_state(create_test_config())
        .unwrap()
        .merge(panic_router())
        .setup_catch_panic();

    let mut app = fluent_router.into_inner();
    let response = app.call(get_request("/panic")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );

    // The panic message never reaches the client
    let body = get_error_response(response).await;
    assert_eq!(body.status, 500);
    assert_eq!(body.message, INTERNAL_ERROR_MESSAGE);
}

#[tokio::test]
async fn test_setup_catch_panic_normal_request() {
    let normal_router = Router::new().route("/normal", get(|| async { "OK" }));

    let mut app = FluentRouter::without_state(Config::from_toml("").unwrap())
        .unwrap()
        .merge(normal_router)
        .setup_catch_panic()
        .into_inner();

    let response = app.call(get_request("/normal")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get_body_string(response).await, "OK");
}

#[tokio::test]
async fn test_panic_inside_full_pipeline() {
    let mut app = FluentRouter::without_state(create_test_config())
        .unwrap()
        .merge(panic_router())
        .setup_middleware()
        .unwrap()
        .into_inner();

    let response = app.call(get_request("/panic")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    // Panics unwind through the request context, so no id is attached
    assert!(response.headers().get(X_REQUEST_ID).is_none());
}
