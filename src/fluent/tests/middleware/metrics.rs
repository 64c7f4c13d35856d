//! Tests for Prometheus metrics collection and the metrics endpoint

use crate::fluent::tests::*;
use crate::{Config, HttpMiddleware};
use axum::http::StatusCode;
use tower::ServiceExt;

async fn scrape(app: Router) -> String {
    let response = app.oneshot(get_request("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    get_body_string(response).await
}

#[tokio::test]
async fn test_requests_are_counted_by_route_template() {
    let app = create_test_router(create_test_config());

    for id in ["1", "2", "3"] {
        let response = app
            .clone()
            .oneshot(get_request(&format!("/items/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    app.clone().oneshot(post_request("/items")).await.unwrap();

    let text = scrape(app).await;
    assert!(
        text.contains(r#"http_requests_total{method="GET",route="/items/{id}",status="200"} 3"#),
        "{text}"
    );
    assert!(text.contains(r#"http_requests_total{method="POST",route="/items",status="415"} 1"#));
    assert!(text.contains("http_request_duration_ms_bucket"));
}

#[tokio::test]
async fn test_scrapes_are_not_counted() {
    let app = create_test_router(create_test_config());
    scrape(app.clone()).await;
    let text = scrape(app).await;
    assert!(!text.contains(r#"route="/metrics""#));
}

#[tokio::test]
async fn test_metrics_route_is_configurable() {
    let app = create_test_router(create_test_config().with_metrics_route("/internal/stats"));
    app.clone().oneshot(get_request("/items")).await.unwrap();

    let response = app.oneshot(get_request("/internal/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(get_body_string(response).await.contains("http_requests_total"));
}

#[tokio::test]
async fn test_metrics_disabled() {
    let configs: [Config; 2] = [
        create_test_config().with_metrics(false),
        create_test_config().with_excluded_middlewares(vec![HttpMiddleware::Metrics]),
    ];
    for config in configs {
        let response = create_test_router(config)
            .oneshot(get_request("/metrics"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
