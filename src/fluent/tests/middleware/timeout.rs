//! Tests for request timeout middleware setup

use crate::fluent::tests::*;
use crate::{FluentRouter, HttpMiddleware};
use axum::{http::StatusCode, routing::get};
use http_body::Frame;
use std::{
    convert::Infallible,
    future::Future,
    pin::Pin,
    task::{Context, Poll, ready},
    time::Duration,
};
use tokio::time::Sleep;
use tower::ServiceExt;

/// Sends its headers at once and a single data frame after `delay`.
struct LateBody {
    delay: Pin<Box<Sleep>>,
    sent: bool,
}

impl LateBody {
    fn new(delay: Duration) -> Self {
        Self {
            delay: Box::pin(tokio::time::sleep(delay)),
            sent: false,
        }
    }
}

impl http_body::Body for LateBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, Infallible>>> {
        if self.sent {
            return Poll::Ready(None);
        }
        ready!(self.delay.as_mut().poll(cx));
        self.sent = true;
        Poll::Ready(Some(Ok(Frame::data(Bytes::from_static(b"late body")))))
    }
}

fn slow_router(config: crate::Config) -> Router {
    FluentRouter::without_state(config)
        .unwrap()
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                "done"
            }),
        )
        .setup_middleware()
        .unwrap()
        .into_inner()
}

#[tokio::test]
async fn test_slow_request_times_out() {
    let config = create_test_config().with_request_timeout(Duration::from_millis(50));
    let response = slow_router(config)
        .oneshot(get_request("/slow"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    assert_eq!(
        get_error_response(response).await.message,
        "Request timed out after 50ms"
    );
}

#[tokio::test]
async fn test_fast_request_completes() {
    let config = create_test_config().with_request_timeout(Duration::from_secs(2));
    let response = slow_router(config)
        .oneshot(get_request("/slow"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get_body_string(response).await, "done");
}

#[tokio::test]
async fn test_excluded_timeout() {
    let config = create_test_config()
        .with_request_timeout(Duration::from_millis(50))
        .with_excluded_middlewares(vec![HttpMiddleware::Timeout]);
    let response = slow_router(config)
        .oneshot(get_request("/slow"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_streaming_response_is_not_replaced() {
    let config = create_test_config().with_request_timeout(Duration::from_millis(50));
    let app = FluentRouter::without_state(config)
        .unwrap()
        .route(
            "/stream",
            get(|| async { Body::new(LateBody::new(Duration::from_millis(200))) }),
        )
        .setup_middleware()
        .unwrap()
        .into_inner();

    let response = app.oneshot(get_request("/stream")).await.unwrap();

    // Headers were produced before the deadline; the body outlives it
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get_body_string(response).await, "late body");
}
