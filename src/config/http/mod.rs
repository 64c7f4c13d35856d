mod content_type;
mod cors;
mod limits;
mod method_whitelist;
mod middleware;
mod rate_limit;
mod sanitizer;
mod security_headers;

pub use content_type::*;
pub use cors::*;
pub use limits::*;
pub use method_whitelist::*;
pub use middleware::*;
pub use rate_limit::*;
pub use sanitizer::*;
pub use security_headers::*;

use {crate::Result, serde::Deserialize, std::time::Duration};

/// HTTP server settings and the configuration of every gate.
///
/// Each gate reads its own sub-table (`[http.cors]`, `[http.rate_limit]`, ...).
/// Missing tables fall back to their defaults, so an empty `[http]` table
/// yields a fully working pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "HttpConfig::default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "HttpConfig::default_bind_port")]
    pub bind_port: u16,

    /// Deadline for producing a response. Disable with `exclude = ["timeout"]`.
    #[serde(
        default = "HttpConfig::default_request_timeout",
        with = "humantime_serde"
    )]
    pub request_timeout: Option<Duration>,

    #[serde(default = "HttpConfig::default_with_metrics")]
    pub with_metrics: bool,

    #[serde(default = "HttpConfig::default_metrics_route")]
    pub metrics_route: String,

    /// Route for liveness checks. By default `liveness` is "/live".
    #[serde(default = "HttpConfig::default_liveness_route")]
    pub liveness_route: String,

    /// Route for readiness checks. Answers `503` once shutdown has begun.
    /// By default `readiness` is "/ready".
    #[serde(default = "HttpConfig::default_readiness_route")]
    pub readiness_route: String,

    #[serde(
        default = "HttpConfig::default_shutdown_timeout",
        with = "humantime_serde"
    )]
    pub shutdown_timeout: Duration,

    #[serde(default)]
    pub header_limits: HttpHeaderLimitsConfig,

    #[serde(default)]
    pub header_sanitizer: HttpHeaderSanitizerConfig,

    #[serde(default)]
    pub content_type: HttpContentTypeConfig,

    #[serde(default)]
    pub body_limit: HttpBodyLimitConfig,

    #[serde(default)]
    pub method_whitelist: HttpMethodWhitelistConfig,

    #[serde(default)]
    pub rate_limit: HttpRateLimitConfig,

    #[serde(default)]
    pub cors: HttpCorsConfig,

    #[serde(default)]
    pub security_headers: HttpSecurityHeadersConfig,

    #[serde(flatten)]
    pub middleware: Option<HttpMiddlewareConfig>,
}

impl HttpConfig {
    pub fn full_bind_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.bind_port)
    }

    fn default_bind_addr() -> String {
        "127.0.0.1".into()
    }

    fn default_bind_port() -> u16 {
        3000
    }

    fn default_request_timeout() -> Option<Duration> {
        Some(Duration::from_millis(5000))
    }

    fn default_with_metrics() -> bool {
        true
    }

    fn default_metrics_route() -> String {
        "/metrics".into()
    }

    fn default_liveness_route() -> String {
        "/live".into()
    }

    fn default_readiness_route() -> String {
        "/ready".into()
    }

    fn default_shutdown_timeout() -> Duration {
        Duration::from_secs(30)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bind_addr.trim().is_empty() {
            return Err(crate::Error::config(
                "HTTP bind_addr is required. Set [http] bind_addr = \"0.0.0.0\" or \"127.0.0.1\" in config.",
            ));
        }

        if self.bind_addr.parse::<std::net::IpAddr>().is_err() {
            return Err(crate::Error::config(
                "HTTP bind_addr must be a valid IP address. Examples: \"127.0.0.1\", \"0.0.0.0\", \"::1\"",
            ));
        }

        if self.with_metrics && !self.metrics_route.starts_with('/') {
            return Err(crate::Error::config(
                "HTTP metrics_route must start with '/'. Example: metrics_route = \"/metrics\"",
            ));
        }

        for (name, route) in [
            ("liveness_route", &self.liveness_route),
            ("readiness_route", &self.readiness_route),
        ] {
            if !route.starts_with('/') {
                return Err(crate::Error::config(format!(
                    "HTTP {name} must start with '/'. Example: {name} = \"/health\"",
                )));
            }
        }

        if self.request_timeout.is_some_and(|t| t.is_zero()) {
            return Err(crate::Error::config(
                "HTTP request_timeout must be > 0. Exclude the 'timeout' middleware to disable it.",
            ));
        }

        self.header_limits.validate()?;
        self.header_sanitizer.validate()?;
        self.content_type.validate()?;
        self.body_limit.validate()?;
        self.method_whitelist.validate()?;
        self.rate_limit.validate()?;
        self.cors.validate()?;
        self.security_headers.validate()?;

        if let Some(middleware_config) = &self.middleware {
            middleware_config.validate()?;
        }

        Ok(())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            bind_addr: Self::default_bind_addr(),
            bind_port: Self::default_bind_port(),
            request_timeout: Self::default_request_timeout(),
            with_metrics: Self::default_with_metrics(),
            metrics_route: Self::default_metrics_route(),
            liveness_route: Self::default_liveness_route(),
            readiness_route: Self::default_readiness_route(),
            shutdown_timeout: Self::default_shutdown_timeout(),
            header_limits: HttpHeaderLimitsConfig::default(),
            header_sanitizer: HttpHeaderSanitizerConfig::default(),
            content_type: HttpContentTypeConfig::default(),
            body_limit: HttpBodyLimitConfig::default(),
            method_whitelist: HttpMethodWhitelistConfig::default(),
            rate_limit: HttpRateLimitConfig::default(),
            cors: HttpCorsConfig::default(),
            security_headers: HttpSecurityHeadersConfig::default(),
            middleware: None,
        }
    }
}
