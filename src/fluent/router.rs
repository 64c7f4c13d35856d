//! Core FluentRouter struct and initialization methods.

use {
    super::{health::Lifecycle, rate_limit::RateLimitKeyFn},
    crate::{Config, HttpMiddleware, Result},
    axum::{Router, extract::Request},
    std::sync::Arc,
    tokio_util::task::AbortOnDropHandle,
};

/// Fluent builder for axum::Router with configuration-based gate setup.
///
/// This wrapper around `axum::Router` provides a fluent API for configuring the
/// request gates and routes based on the application configuration. Create
/// instances using [`FluentRouter::without_state`] or [`FluentRouter::with_state`].
///
/// The router forwards layering and nesting calls to the underlying `axum::Router`,
/// and each gate is installed by a dedicated `setup_*` method. Most applications
/// only need [`FluentRouter::setup_middleware`], which installs all of them in
/// the right order.
///
/// ```rust,no_run
/// use axum::routing::get;
/// use axum_gatekeeper::{Config, FluentRouter};
///
/// # async fn example() -> axum_gatekeeper::Result<()> {
/// FluentRouter::without_state(Config::default())?
///     .route("/items", get(|| async { "[]" }))
///     .setup_middleware()?
///     .start()
///     .await
/// # }
/// ```
pub struct FluentRouter<State = ()> {
    pub(crate) config: Config,
    pub(crate) state: State,
    pub(crate) inner: Router<State>,
    pub(crate) rate_limit_key: Option<RateLimitKeyFn>,
    pub(crate) rate_limit_cleanup: Option<AbortOnDropHandle<()>>,
    pub(crate) lifecycle: Arc<Lifecycle>,
}

impl FluentRouter {
    /// Creates a new `FluentRouter` without application state.
    pub fn without_state(config: Config) -> Result<FluentRouter<()>> {
        FluentRouter::<()>::with_state(config, ())
    }
}

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Creates a new `FluentRouter` with the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails, for instance when
    /// the bind address is malformed, a CORS origin is not a URL, or logging is
    /// enabled while the request context is excluded.
    pub fn with_state<S: Clone + Send + Sync + 'static>(
        config: Config,
        state: S,
    ) -> Result<FluentRouter<S>> {
        config.validate()?;

        Ok(FluentRouter {
            config,
            state,
            inner: Router::new(),
            rate_limit_key: None,
            rate_limit_cleanup: None,
            lifecycle: Arc::new(Lifecycle::new()),
        })
    }

    /// Returns the configuration the router was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replaces the function that decides which client a request is counted
    /// against by the rate limiter. Defaults to the client IP address.
    ///
    /// Must be called before [`FluentRouter::setup_rate_limiting`] (or
    /// [`FluentRouter::setup_middleware`]).
    ///
    /// ```rust
    /// # use axum_gatekeeper::{Config, FluentRouter};
    /// # fn example() -> axum_gatekeeper::Result<()> {
    /// let router = FluentRouter::without_state(Config::default())?
    ///     .with_rate_limit_key(|req| {
    ///         req.headers()
    ///             .get("x-api-key")
    ///             .and_then(|v| v.to_str().ok())
    ///             .unwrap_or("anonymous")
    ///             .to_string()
    ///     });
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn with_rate_limit_key<F>(self, key: F) -> Self
    where
        F: Fn(&Request) -> String + Send + Sync + 'static,
    {
        Self {
            rate_limit_key: Some(Arc::new(key)),
            ..self
        }
    }

    /// Helper method to check if a middleware is enabled in the configuration.
    /// Returns true if no middleware config is specified (all enabled by default),
    /// or if the middleware is explicitly enabled/not excluded.
    pub(crate) fn is_middleware_enabled(&self, middleware: HttpMiddleware) -> bool {
        self.config
            .http
            .middleware
            .as_ref()
            .map(|config| config.is_enabled(middleware))
            .unwrap_or(true) // If no middleware config, all are enabled
    }
}
