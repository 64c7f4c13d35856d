//! Prometheus request counter and latency histogram.

use {
    crate::Result,
    axum::{
        extract::{MatchedPath, Request, State},
        middleware::Next,
        response::Response,
    },
    prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder},
    std::{sync::Arc, time::Instant},
};

const LABELS: &[&str] = &["method", "route", "status"];
const DURATION_BUCKETS_MS: &[f64] = &[5.0, 15.0, 50.0, 100.0, 250.0, 500.0, 1000.0];

/// Metrics owned by one router. Each router has its own registry so several
/// routers can live in one process, as they do in tests.
#[derive(Clone)]
pub(crate) struct HttpMetrics {
    registry: Registry,
    requests: IntCounterVec,
    duration: HistogramVec,
    metrics_route: String,
}

impl HttpMetrics {
    pub(crate) fn new(metrics_route: impl Into<String>) -> Result<Self> {
        let registry = Registry::new();
        let requests = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests"),
            LABELS,
        )?;
        let duration = HistogramVec::new(
            HistogramOpts::new("http_request_duration_ms", "HTTP request duration in ms")
                .buckets(DURATION_BUCKETS_MS.to_vec()),
            LABELS,
        )?;
        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(duration.clone()))?;

        Ok(Self {
            registry,
            requests,
            duration,
            metrics_route: metrics_route.into(),
        })
    }

    pub(crate) fn observe(&self, method: &str, route: &str, status: u16, duration_ms: f64) {
        let status = status.to_string();
        let labels = [method, route, status.as_str()];
        self.requests.with_label_values(&labels).inc();
        self.duration.with_label_values(&labels).observe(duration_ms);
    }

    /// Text exposition of everything in the registry.
    pub(crate) fn render(&self) -> Result<String> {
        Ok(TextEncoder::new().encode_to_string(&self.registry.gather())?)
    }
}

pub(crate) async fn observe_request(
    State(metrics): State<Arc<HttpMetrics>>,
    req: Request,
    next: Next,
) -> Response {
    if req.uri().path() == metrics.metrics_route {
        return next.run(req).await;
    }

    let method = req.method().clone();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let start = Instant::now();

    let response = next.run(req).await;

    metrics.observe(
        method.as_str(),
        &route,
        response.status().as_u16(),
        start.elapsed().as_secs_f64() * 1000.0,
    );
    response
}
