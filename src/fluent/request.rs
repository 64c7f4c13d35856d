//! Request inspection gates: header limits, header sanitizer, content type, body limit.

use super::router::FluentRouter;
use crate::HttpMiddleware;

use {
    super::{
        body_limit::limit_body,
        content_type::check_content_type,
        headers::{HeaderRules, limit_headers, sanitize_headers},
    },
    axum::{extract::DefaultBodyLimit, middleware::from_fn_with_state},
    std::sync::Arc,
};

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Sets up the header count and size limits.
    ///
    /// Rejects requests with too many header lines or oversized headers with
    /// `431 Request Header Fields Too Large`, and chunked request bodies with
    /// `415 Unsupported Media Type` unless `allow_chunked` is set.
    ///
    /// # Configuration
    ///
    /// ```toml
    /// [http.header_limits]
    /// max_header_count = 100
    /// max_single_header_bytes = 4096
    /// max_total_header_bytes = 8192
    /// allow_chunked = false
    /// ```
    #[must_use]
    pub fn setup_header_limits(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::HeaderLimits) {
            return self;
        }

        let limits = Arc::new(self.config.http.header_limits.clone());
        self.inner = self.inner.layer(from_fn_with_state(limits, limit_headers));
        self
    }

    /// Sets up the header sanitizer.
    ///
    /// Block-listed headers, duplicates, malformed names and values with control
    /// characters are rejected with `400 Bad Request`. Headers that pass but are
    /// not on the allow-list are silently dropped before the handler sees them.
    #[must_use]
    pub fn setup_header_sanitizer(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::HeaderSanitizer) {
            return self;
        }

        let rules = Arc::new(HeaderRules::from(&self.config.http.header_sanitizer));
        self.inner = self.inner.layer(from_fn_with_state(rules, sanitize_headers));
        self
    }

    /// Sets up the `Content-Type` gate.
    ///
    /// `GET`, `DELETE`, `HEAD` and `OPTIONS` must not declare a body. `POST`,
    /// `PUT` and `PATCH` must declare one of the media types allowed for the path.
    ///
    /// # Configuration
    ///
    /// ```toml
    /// [http.content_type]
    /// default_allowed = ["application/json"]
    ///
    /// [[http.content_type.route_overrides]]
    /// prefix = "/uploads"
    /// allowed = ["multipart/form-data"]
    /// ```
    #[must_use]
    pub fn setup_content_type(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::ContentType) {
            return self;
        }

        let config = Arc::new(self.config.http.content_type.clone());
        self.inner = self
            .inner
            .layer(from_fn_with_state(config, check_content_type));
        self
    }

    /// Sets up the streaming request body limit.
    ///
    /// Axum's own buffered body limit is disabled so that the limit resolved for
    /// the path is the only one that applies.
    ///
    /// # Configuration
    ///
    /// ```toml
    /// [http.body_limit]
    /// default_limit = "1MiB"
    ///
    /// [[http.body_limit.route_overrides]]
    /// prefix = "/uploads"
    /// limit = "20MiB"
    /// ```
    #[must_use]
    pub fn setup_body_limit(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::BodyLimit) {
            return self;
        }

        let config = Arc::new(self.config.http.body_limit.clone());
        self.inner = self
            .inner
            .layer(DefaultBodyLimit::disable())
            .layer(from_fn_with_state(config, limit_body));
        self
    }
}
