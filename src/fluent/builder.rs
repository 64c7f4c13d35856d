//! Orchestration and router delegation: setup_middleware(), start(), layer(), route(), etc.

use super::{health::Lifecycle, router::FluentRouter};
use crate::Result;

use {
    axum::{Router, body::Body, routing::Route},
    http::Request,
    std::{convert::Infallible, net::SocketAddr, sync::Arc},
    tokio::{signal, sync::Notify},
    tower::{Layer, Service},
};

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Sets up all gates in the correct order.
    ///
    /// This is the **recommended way** to configure the pipeline. Call it after
    /// all routes were added: layers only wrap the routes that exist when they
    /// are added.
    ///
    /// # Middleware Order
    ///
    /// **CRITICAL**: Middleware is processed outside-in for requests and inside-out for responses.
    /// The **last layer added is the outermost layer** and executes **first** on incoming requests.
    ///
    /// The current order (from innermost to outermost):
    /// 1. **Body limit** - Count body bytes as the handler reads them
    /// 2. **Content type** - Match `Content-Type` against the method and path
    /// 3. **Header sanitizer** - Reject hostile headers, drop unknown ones
    /// 4. **Header limits** - Count and size ceilings, chunked bodies
    /// 5. **Method whitelist** - Reject unlisted methods
    /// 6. **Rate limiting** - Sliding window per client
    ///    - Liveness and readiness routes are added here, outside the gates above
    /// 7. **CORS** - Origin check and preflight
    /// 8. **Security headers** - Applied to every response, rejections included
    /// 9. **Timeout** - Bound the time spent in all of the above (optional)
    /// 10. **Metrics** - Measure all requests
    /// 11. **Logging** - Log all requests
    /// 12. **Request context** - Request id and span for everything inside
    /// 13. **Panic catching** - Catch ALL panics from inner layers (outermost)
    ///
    /// The not-found fallback is installed first so that unmatched routes pass
    /// through the same gates.
    ///
    /// # Manual Setup (Advanced)
    ///
    /// If you need custom ordering, call individual `setup_*` methods. Methods
    /// must be called in reverse execution order (first method called = innermost
    /// layer = executes last on request). Use `[http] exclude = [...]` rather than
    /// skipping methods.
    ///
    /// ```rust,no_run
    /// # use axum_gatekeeper::{Config, FluentRouter, Result};
    /// # fn example() -> Result<()> {
    /// let router = FluentRouter::without_state(Config::default())?
    ///     .setup_not_found()
    ///     .setup_body_limit()
    ///     .setup_content_type()
    ///     .setup_logging()
    ///     .setup_request_context()
    ///     .setup_catch_panic();
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the CORS policy, the security headers or the metrics
    /// registry cannot be built from the configuration.
    pub fn setup_middleware(self) -> Result<Self> {
        // Output the current version of the service
        const PACKAGE_NAME: &str = env!("CARGO_PKG_NAME");
        const VERSION: &str = env!("CARGO_PKG_VERSION");
        tracing::info!("Starting {PACKAGE_NAME} version {VERSION}...");

        // Middleware is added from innermost to outermost
        // The last layer added executes FIRST on incoming requests
        let router = self
            .setup_not_found()
            .setup_body_limit() // 1. Streaming body limit
            .setup_content_type() // 2. Content-Type gate
            .setup_header_sanitizer() // 3. Header sanitizer
            .setup_header_limits() // 4. Header count/size limits
            .setup_method_whitelist() // 5. Method whitelist
            .setup_rate_limiting() // 6. Rate limiting
            .setup_liveness_readiness() // Health checks skip the gates above
            .setup_cors()? // 7. CORS
            .setup_security_headers()? // 8. Security headers
            .setup_timeout() // 9. Request timeout (optional)
            .setup_metrics()? // 10. Metrics collection
            .setup_logging() // 11. Access logging
            .setup_request_context() // 12. Request id and span
            .setup_catch_panic(); // 13. Outermost - panic recovery

        Ok(router)
    }

    /// Starts the HTTP server based on the current configuration.
    ///
    /// The server supports both HTTP/1.1 and HTTP/2 protocols automatically.
    ///
    /// # Graceful Shutdown
    ///
    /// When a shutdown signal is received (SIGTERM or SIGINT), the server stops
    /// accepting new connections and waits for in-flight requests to complete,
    /// up to `shutdown_timeout`. If they drain earlier, shutdown completes early.
    /// The readiness route answers `503` from the moment the signal arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound or the server fails.
    pub async fn start(self) -> Result<()> {
        let bind_addr = self.config.http.full_bind_addr();
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!("Bound to {}", &bind_addr);
        tracing::info!("Waiting for connections");

        // Keeps the rate limiter cleanup alive for as long as the server runs
        let _rate_limit_cleanup = self.rate_limit_cleanup;

        let service = self
            .inner
            .with_state(self.state)
            .into_make_service_with_connect_info::<SocketAddr>();

        let shutdown_timeout = self.config.http.shutdown_timeout;
        let shutdown_started = Arc::new(Notify::new());

        let serve_future = axum::serve(listener, service)
            .with_graceful_shutdown(shutdown_signal(
                shutdown_started.clone(),
                self.lifecycle.clone(),
            ));

        // The timeout only starts AFTER a shutdown signal is received
        tokio::select! {
            result = serve_future => {
                tracing::info!("Graceful shutdown completed");
                result?;
            }
            _ = async {
                shutdown_started.notified().await;
                tokio::time::sleep(shutdown_timeout).await;
            } => {
                tracing::warn!("Graceful shutdown timeout expired, forcing shutdown");
            }
        }

        Ok(())
    }

    /// Adds a custom Tower middleware layer to the router.
    ///
    /// This is a low-level method that forwards to `axum::Router::layer()`,
    /// allowing you to add custom middleware that isn't provided by the library.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request<Body>> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request<Body>>>::Response: axum::response::IntoResponse + 'static,
        <L::Service as Service<Request<Body>>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<Request<Body>>>::Future: Send + 'static,
    {
        self.inner = self.inner.layer(layer);
        self
    }

    /// Adds a new route to the router at the specified path.
    ///
    /// # Examples
    ///
    /// ```
    /// use axum_gatekeeper::{Config, FluentRouter};
    /// use axum::routing::get;
    ///
    /// async fn handler() -> &'static str {
    ///     "Hello, World!"
    /// }
    ///
    /// # fn example() {
    /// let router = FluentRouter::without_state(Config::default())
    ///     .unwrap()
    ///     .route("/hello", get(handler))
    ///     .into_inner();
    /// # }
    /// ```
    #[must_use]
    pub fn route(mut self, path: &str, route: axum::routing::MethodRouter<State>) -> Self {
        self.inner = self.inner.route(path, route);
        self
    }

    /// Adds a middleware layer that only applies to routes, not services.
    #[must_use]
    pub fn route_layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request<Body>> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request<Body>>>::Response: axum::response::IntoResponse + 'static,
        <L::Service as Service<Request<Body>>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<Request<Body>>>::Future: Send + 'static,
    {
        self.inner = self.inner.route_layer(layer);
        self
    }

    /// Nests another router at a specific path prefix.
    ///
    /// ```rust,no_run
    /// use axum::{Router, routing::get};
    /// # use axum_gatekeeper::{Config, FluentRouter};
    /// # fn example() -> axum_gatekeeper::Result<()> {
    ///
    /// let api_v1 = Router::new()
    ///     .route("/items", get(|| async { "items" }));
    ///
    /// let app = FluentRouter::without_state(Config::default())?
    ///     .nest("/api/v1", api_v1);  // Routes at /api/v1/items
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn nest(mut self, path: &str, router: Router<State>) -> Self {
        self.inner = self.inner.nest(path, router);
        self
    }

    /// Nests a Tower service at a specific path prefix.
    #[must_use]
    pub fn nest_service<T>(mut self, path: &str, service: T) -> Self
    where
        T: Service<Request<Body>, Response = axum::response::Response, Error = Infallible>
            + Clone
            + Send
            + Sync
            + 'static,
        T::Future: Send + 'static,
    {
        self.inner = self.inner.nest_service(path, service);
        self
    }

    /// Merges another router into this one, without a path prefix.
    #[must_use]
    pub fn merge(mut self, other: Router<State>) -> Self {
        self.inner = self.inner.merge(other);
        self
    }

    /// Adds a Tower service at an exact path.
    #[must_use]
    pub fn route_service<T>(mut self, path: &str, service: T) -> Self
    where
        T: Service<Request<Body>, Response = axum::response::Response, Error = Infallible>
            + Clone
            + Send
            + Sync
            + 'static,
        T::Future: Send + 'static,
    {
        self.inner = self.inner.route_service(path, service);
        self
    }

    /// Consumes the `FluentRouter` and returns the underlying `axum::Router`.
    ///
    /// The rate limiter keeps working without its cleanup task, which stops
    /// here; idle keys are then only pruned when the same client returns.
    pub fn into_inner(self) -> Router<State> {
        self.inner
    }
}

/// Resolves on Ctrl+C or SIGTERM, withdraws readiness and wakes `started` so
/// the caller can begin the shutdown grace period.
///
/// If signal registration fails, the function logs a warning and waits
/// indefinitely so the server keeps running.
async fn shutdown_signal(started: Arc<Notify>, lifecycle: Arc<Lifecycle>) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => tracing::debug!("Ctrl+C signal received"),
            Err(err) => {
                tracing::warn!("Failed to install Ctrl+C handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal_handler) => {
                signal_handler.recv().await;
                tracing::debug!("SIGTERM signal received");
            }
            Err(err) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
    lifecycle.begin_shutdown();
    started.notify_one();
}
