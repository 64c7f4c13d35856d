//! Sliding-window rate limiting keyed by client.
//!
//! Every key keeps the instants of its recent requests. A request is admitted
//! while the number of instants inside the trailing window, itself included,
//! stays at or below `max`.

use {
    crate::{Error, HttpRateLimitConfig},
    axum::{
        extract::{ConnectInfo, Request},
        response::{IntoResponse, Response},
    },
    dashmap::DashMap,
    http::{HeaderValue, header::RETRY_AFTER},
    std::{
        collections::VecDeque,
        future::Future,
        net::SocketAddr,
        pin::Pin,
        sync::Arc,
        task::{Context, Poll},
        time::{Duration, Instant},
    },
    tower::{Layer, Service},
};

/// Derives the rate limiting key of a request.
pub type RateLimitKeyFn = Arc<dyn Fn(&Request) -> String + Send + Sync>;

/// Client IP from `ConnectInfo`, or `unknown` when the server was not started
/// with connect info.
pub(crate) fn client_ip_key(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".into())
}

/// Request instants per key, shared by every clone of the layer.
#[derive(Clone)]
pub(crate) struct SlidingWindowTracker {
    hits: Arc<DashMap<String, VecDeque<Instant>>>,
    window: Duration,
    max: usize,
}

impl SlidingWindowTracker {
    pub(crate) fn new(window: Duration, max: usize) -> Self {
        Self {
            hits: Arc::new(DashMap::new()),
            window,
            max,
        }
    }

    /// Records a request for `key` at `now` and reports whether it is admitted.
    ///
    /// Rejected requests are recorded too, so a client that keeps retrying
    /// stays limited until it backs off for a full window.
    pub(crate) fn check(&self, key: String, now: Instant) -> bool {
        let mut hits = self.hits.entry(key).or_default();
        while hits
            .front()
            .is_some_and(|t| now.saturating_duration_since(*t) >= self.window)
        {
            hits.pop_front();
        }
        hits.push_back(now);
        hits.len() <= self.max
    }

    /// Drops keys without any request inside the window.
    pub(crate) fn cleanup_expired(&self) {
        let now = Instant::now();
        self.hits.retain(|_, hits| {
            hits.back()
                .is_some_and(|t| now.saturating_duration_since(*t) < self.window)
        });
    }

    pub(crate) fn len(&self) -> usize {
        self.hits.len()
    }
}

/// Layer that applies the rate limiter.
#[derive(Clone)]
pub(crate) struct RateLimitLayer {
    tracker: SlidingWindowTracker,
    key: RateLimitKeyFn,
    retry_after: HeaderValue,
    message: Arc<str>,
}

impl RateLimitLayer {
    pub(crate) fn new(config: &HttpRateLimitConfig, key: RateLimitKeyFn) -> Self {
        let retry_after = config.retry_after_secs();
        Self {
            tracker: SlidingWindowTracker::new(config.window, config.max as usize),
            key,
            retry_after: HeaderValue::from(retry_after),
            message: format!(
                "Too many requests — limit is {} per {retry_after}s.",
                config.max
            )
            .into(),
        }
    }

    /// Get a clone of the tracker for cleanup tasks
    pub(crate) fn tracker(&self) -> SlidingWindowTracker {
        self.tracker.clone()
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            layer: self.clone(),
        }
    }
}

#[derive(Clone)]
pub(crate) struct RateLimitService<S> {
    inner: S,
    layer: RateLimitLayer,
}

impl<S> Service<Request> for RateLimitService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let key = (self.layer.key)(&req);

        if !self.layer.tracker.check(key.clone(), Instant::now()) {
            tracing::debug!(key = %key, "Rate limit exceeded");
            let response = Error::too_many_requests(self.layer.message.to_string())
                .with_header(RETRY_AFTER, self.layer.retry_after.clone())
                .into_response();
            return Box::pin(async move { Ok(response) });
        }

        // Keep the service that was polled ready
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(req).await })
    }
}

/// Background task to periodically drop idle keys
pub(crate) async fn cleanup_task(tracker: SlidingWindowTracker, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        tracker.cleanup_expired();
        tracing::debug!("remaining rate limiting keys: {}", tracker.len());
    }
}
