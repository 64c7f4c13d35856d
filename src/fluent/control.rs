//! Traffic control middleware: rate limiting and panic catching.

use super::router::FluentRouter;
use crate::{Error, HttpMiddleware};

use {
    super::rate_limit::{RateLimitKeyFn, RateLimitLayer, cleanup_task, client_ip_key},
    axum::response::IntoResponse,
    std::sync::Arc,
    tokio::runtime::Handle,
    tokio_util::task::AbortOnDropHandle,
    tower_http::catch_panic::CatchPanicLayer,
};

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Sets up the sliding-window rate limiter.
    ///
    /// Each client may send at most `max` requests within any trailing `window`.
    /// Excess requests receive `429 Too Many Requests` with a `Retry-After` header.
    ///
    /// # Configuration
    ///
    /// ```toml
    /// [http.rate_limit]
    /// window = "60s"
    /// max = 100              # 0 disables rate limiting
    /// cleanup_interval = "60s"
    /// ```
    ///
    /// # Notes
    ///
    /// Clients are keyed by IP address unless a key function was installed with
    /// [`FluentRouter::with_rate_limit_key`]. Behind a reverse proxy, every request
    /// shares the proxy's address unless such a key function is used.
    ///
    /// Idle keys are dropped by a background task that lives as long as the
    /// router. It is only started when called from within a Tokio runtime.
    #[must_use]
    pub fn setup_rate_limiting(mut self) -> Self {
        let config = &self.config.http.rate_limit;
        if !config.is_enabled() || !self.is_middleware_enabled(HttpMiddleware::RateLimiting) {
            return self;
        }

        let key = self
            .rate_limit_key
            .clone()
            .unwrap_or_else(|| Arc::new(client_ip_key) as RateLimitKeyFn);
        let layer = RateLimitLayer::new(config, key);

        match Handle::try_current() {
            Ok(handle) => {
                let task = handle.spawn(cleanup_task(layer.tracker(), config.cleanup_interval));
                self.rate_limit_cleanup = Some(AbortOnDropHandle::new(task));
            }
            Err(_) => tracing::warn!(
                "No Tokio runtime available, idle rate limiting keys will not be cleaned up"
            ),
        }

        self.inner = self.inner.layer(layer);
        self
    }

    /// Sets up panic catching middleware.
    ///
    /// Catches panics in request handlers and returns the standard
    /// `500 Internal Server Error` envelope instead of dropping the connection.
    /// The panic message is logged but never sent to the client.
    ///
    /// This middleware is automatically included in `setup_middleware()` as the
    /// outermost layer to ensure ALL panics are caught.
    #[must_use]
    pub fn setup_catch_panic(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::CatchPanic) {
            return self;
        }

        self.inner = self.inner.layer(CatchPanicLayer::custom(
            |err: Box<dyn std::any::Any + Send + 'static>| {
                let msg = if let Some(s) = err.downcast_ref::<String>() {
                    format!("Service panicked: {s}")
                } else if let Some(s) = err.downcast_ref::<&str>() {
                    format!("Service panicked: {s}")
                } else {
                    "Service panicked with a non-string payload".to_string()
                };
                Error::internal(msg).into_response()
            },
        ));
        self
    }
}
