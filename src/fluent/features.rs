//! Policy gates: CORS, security headers, method whitelist, timeout, health checks, not-found fallback.

use super::router::FluentRouter;
use crate::{Error, HttpMiddleware, Result};

use {
    super::{
        cors::{CorsPolicy, cors},
        health::{liveness, readiness},
        method_whitelist::{MethodWhitelist, check_method},
        security_headers::{SecurityHeaders, security_headers},
    },
    axum::{
        extract::{Request, State},
        middleware::{Next, from_fn_with_state},
        response::Response,
        routing::get,
    },
    http::{Method, Uri},
    std::{sync::Arc, time::Duration},
};

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Sets up the CORS gate.
    ///
    /// Requests without an `Origin` header pass untouched, except `OPTIONS`,
    /// which is always answered here. Requests from an origin outside the policy
    /// get `403 Forbidden`, and preflight `OPTIONS` requests are answered with
    /// `204 No Content` without reaching the handler.
    ///
    /// # Configuration
    ///
    /// ```toml
    /// [http.cors]
    /// allowed_origins = ["https://app.example.com"]
    /// allow_credentials = true
    /// max_age = "10m"
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if a configured method or header cannot be written as a
    /// header value.
    pub fn setup_cors(mut self) -> Result<Self> {
        if !self.is_middleware_enabled(HttpMiddleware::Cors) {
            return Ok(self);
        }

        let policy = Arc::new(CorsPolicy::try_from(&self.config.http.cors)?);
        self.inner = self.inner.layer(from_fn_with_state(policy, cors));
        Ok(self)
    }

    /// Sets up the security headers written on every response.
    ///
    /// `x-powered-by` and `server` are removed. Documentation routes (by default
    /// `/docs` and `/openapi.json`) do not get `Content-Security-Policy` nor
    /// `X-Frame-Options` so that interactive API explorers keep working.
    ///
    /// # Configuration
    ///
    /// ```toml
    /// [http.security_headers]
    /// x_frame_options = "SAMEORIGIN"
    /// strict_transport_security = ""  # empty disables the header
    /// ```
    pub fn setup_security_headers(mut self) -> Result<Self> {
        if !self.is_middleware_enabled(HttpMiddleware::SecurityHeaders) {
            return Ok(self);
        }

        let bundle = Arc::new(SecurityHeaders::try_from(&self.config.http.security_headers)?);
        self.inner = self
            .inner
            .layer(from_fn_with_state(bundle, security_headers));
        Ok(self)
    }

    /// Sets up the method whitelist.
    ///
    /// Methods that are not listed get `405 Method Not Allowed`. `HEAD` and
    /// `OPTIONS` always pass.
    #[must_use]
    pub fn setup_method_whitelist(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::MethodWhitelist) {
            return self;
        }

        let whitelist = Arc::new(MethodWhitelist::from(&self.config.http.method_whitelist));
        self.inner = self
            .inner
            .layer(from_fn_with_state(whitelist, check_method));
        self
    }

    /// Sets up request timeout middleware.
    ///
    /// Aborts requests that take longer than the configured duration with a
    /// `408 Request Timeout` response.
    ///
    /// # Configuration
    ///
    /// ```toml
    /// [http]
    /// request_timeout = "30s"  # Optional, uses humantime format
    /// ```
    #[must_use]
    pub fn setup_timeout(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::Timeout) {
            return self;
        }

        if let Some(timeout) = self.config.http.request_timeout {
            self.inner = self
                .inner
                .layer(from_fn_with_state(timeout, enforce_timeout));
        }
        self
    }

    /// Sets up the liveness and readiness health checks.
    ///
    /// - **Liveness** - `200` with `{"alive", "uptime", "timestamp"}` while the process runs
    /// - **Readiness** - `200` with `{"ready": true}`, `503` with `{"ready": false}`
    ///   once a shutdown signal was received
    ///
    /// The routes only pass through the layers added after them, so
    /// [`FluentRouter::setup_middleware`] installs them outside the rate limiter
    /// and the request gates.
    ///
    /// # Configuration
    ///
    /// ```toml
    /// [http]
    /// liveness_route = "/live"   # Default
    /// readiness_route = "/ready" # Default
    /// ```
    #[must_use]
    pub fn setup_liveness_readiness(mut self) -> Self {
        if self.is_middleware_enabled(HttpMiddleware::Liveness) {
            let lifecycle = self.lifecycle.clone();
            self.inner = self.inner.route(
                &self.config.http.liveness_route,
                get(move || liveness(lifecycle.clone())).fallback(route_not_found),
            );
        }

        if self.is_middleware_enabled(HttpMiddleware::Readiness) {
            let lifecycle = self.lifecycle.clone();
            self.inner = self.inner.route(
                &self.config.http.readiness_route,
                get(move || readiness(lifecycle.clone())).fallback(route_not_found),
            );
        }
        self
    }

    /// Answers unmatched routes with the standard `404` envelope.
    ///
    /// A path that exists without a handler for the request method is treated
    /// the same way, so `PUT /items` on a `GET`-only route gets the envelope
    /// instead of axum's empty `405`.
    ///
    /// Fallbacks only receive the layers added after them, so this must be
    /// called before any other `setup_*` method.
    #[must_use]
    pub fn setup_not_found(mut self) -> Self {
        self.inner = self
            .inner
            .fallback(route_not_found)
            .method_not_allowed_fallback(route_not_found);
        self
    }
}

async fn enforce_timeout(
    State(timeout): State<Duration>,
    req: Request,
    next: Next,
) -> Result<Response> {
    tokio::time::timeout(timeout, next.run(req))
        .await
        .map_err(|_| {
            Error::request_timeout(format!(
                "Request timed out after {}ms",
                timeout.as_millis()
            ))
        })
}

pub(crate) async fn route_not_found(method: Method, uri: Uri) -> Error {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    Error::not_found(format!(
        "Route not found — No route matches {method} {path}."
    ))
}
