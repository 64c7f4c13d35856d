//! Observability middleware: request context, access logging, and Prometheus metrics.

use super::router::FluentRouter;
use crate::{HttpMiddleware, Result, context, context::RequestContext};

use {
    super::access_log::log_access,
    axum::{
        extract::{ConnectInfo, Request},
        middleware::{Next, from_fn},
        response::Response,
    },
    http::{HeaderName, HeaderValue},
    std::net::SocketAddr,
    tracing::Instrument,
};

#[cfg(feature = "metrics")]
use {
    super::{
        features::route_not_found,
        metrics::{HttpMetrics, observe_request},
    },
    axum::{middleware::from_fn_with_state, routing::get},
    std::sync::Arc,
};

/// Response header carrying the id generated for the request.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Sets up the per-request context.
    ///
    /// Every request gets a fresh 8 character request id, which is:
    /// - available to all code serving the request through [`crate::context`]
    /// - recorded on an `http_request` tracing span wrapping the rest of the pipeline
    /// - returned to the client in the `x-request-id` response header
    ///
    /// Incoming `x-request-id` headers are ignored.
    #[must_use]
    pub fn setup_request_context(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::RequestContext) {
            return self;
        }

        self.inner = self.inner.layer(from_fn(scope_request));
        self
    }

    /// Sets up structured access logging.
    ///
    /// One line is logged per request when its response is ready:
    ///
    /// ```text
    /// 200 GET     /items                           1.25ms
    /// ```
    ///
    /// Server errors are logged at `error`, client errors at `warn` and
    /// everything else at `info`. Log output format is controlled by the
    /// `logging.format` configuration.
    #[must_use]
    pub fn setup_logging(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::Logging) {
            return self;
        }

        self.inner = self.inner.layer(from_fn(log_access));
        self
    }

    /// Sets up Prometheus metrics collection and endpoint.
    ///
    /// When `config.http.with_metrics` is true, this method:
    /// - Adds a metrics endpoint at the configured route (default: `/metrics`)
    /// - Counts requests in `http_requests_total`
    /// - Records latencies in the `http_request_duration_ms` histogram
    ///
    /// Both are labeled by method, route and status. Every router owns its own
    /// registry, so tests can build as many routers as they like.
    ///
    /// # Configuration
    ///
    /// ```toml
    /// [http]
    /// with_metrics = true
    /// metrics_route = "/metrics"
    /// ```
    #[cfg(feature = "metrics")]
    pub fn setup_metrics(mut self) -> Result<Self> {
        if !self.config.http.with_metrics || !self.is_middleware_enabled(HttpMiddleware::Metrics) {
            return Ok(self);
        }

        let metrics_route = self.config.http.metrics_route.clone();
        let metrics = Arc::new(HttpMetrics::new(metrics_route.clone())?);
        let exporter = metrics.clone();

        self.inner = self
            .inner
            .route(
                &metrics_route,
                get(move || {
                    let exporter = exporter.clone();
                    async move { exporter.render() }
                })
                .fallback(route_not_found),
            )
            .layer(from_fn_with_state(metrics, observe_request));
        Ok(self)
    }

    /// No-op when `metrics` feature is disabled.
    #[cfg(not(feature = "metrics"))]
    pub fn setup_metrics(self) -> Result<Self> {
        if self.config.http.with_metrics {
            tracing::warn!(
                "Metrics are enabled in config but the 'metrics' feature is not enabled. \
                 Add `metrics` to your Cargo.toml features to enable metrics support."
            );
        }
        Ok(self)
    }
}

async fn scope_request(req: Request, next: Next) -> Response {
    let client_address = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".into());
    let path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let ctx = RequestContext::new(req.method().as_str(), path, client_address);
    let request_id = ctx.request_id.clone();
    let span = tracing::info_span!(
        "http_request",
        request_id = %ctx.request_id,
        method = %ctx.method,
        path = %ctx.path,
    );

    let mut response = context::run(ctx, next.run(req)).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}
