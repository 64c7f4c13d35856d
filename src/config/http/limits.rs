use crate::{Error, Result, utils::RouteOverride};
use byte_unit::Byte;
use serde::Deserialize;

/// Ceilings enforced on the request header block.
///
/// ```toml
/// [http.header_limits]
/// max_header_count = 100
/// max_single_header_bytes = 4096
/// max_total_header_bytes = 8192
/// allow_chunked = false
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct HttpHeaderLimitsConfig {
    #[serde(default = "HttpHeaderLimitsConfig::default_max_header_count")]
    pub max_header_count: usize,

    /// Name bytes plus value bytes of a single header field.
    #[serde(default = "HttpHeaderLimitsConfig::default_max_single_header_bytes")]
    pub max_single_header_bytes: usize,

    #[serde(default = "HttpHeaderLimitsConfig::default_max_total_header_bytes")]
    pub max_total_header_bytes: usize,

    /// Accept `Transfer-Encoding: chunked` request bodies.
    #[serde(default)]
    pub allow_chunked: bool,
}

impl HttpHeaderLimitsConfig {
    fn default_max_header_count() -> usize {
        100
    }

    fn default_max_single_header_bytes() -> usize {
        4096
    }

    fn default_max_total_header_bytes() -> usize {
        8192
    }

    pub fn with_max_header_count(mut self, max: usize) -> Self {
        self.max_header_count = max;
        self
    }

    pub fn with_max_single_header_bytes(mut self, max: usize) -> Self {
        self.max_single_header_bytes = max;
        self
    }

    pub fn with_max_total_header_bytes(mut self, max: usize) -> Self {
        self.max_total_header_bytes = max;
        self
    }

    pub fn with_allow_chunked(mut self, allow: bool) -> Self {
        self.allow_chunked = allow;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_header_count == 0
            || self.max_single_header_bytes == 0
            || self.max_total_header_bytes == 0
        {
            return Err(Error::config(
                "[http.header_limits] values must all be > 0.",
            ));
        }
        Ok(())
    }
}

impl Default for HttpHeaderLimitsConfig {
    fn default() -> Self {
        Self {
            max_header_count: Self::default_max_header_count(),
            max_single_header_bytes: Self::default_max_single_header_bytes(),
            max_total_header_bytes: Self::default_max_total_header_bytes(),
            allow_chunked: false,
        }
    }
}

/// Byte ceilings for request bodies.
///
/// ```toml
/// [http.body_limit]
/// default_limit = "1MiB"
///
/// [[http.body_limit.route_overrides]]
/// prefix = "/uploads"
/// limit = "20MiB"
/// ```
///
/// Overrides are matched by path prefix in the order they are declared.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpBodyLimitConfig {
    #[serde(default = "HttpBodyLimitConfig::default_limit")]
    pub default_limit: Byte,

    #[serde(default)]
    pub route_overrides: Vec<BodyLimitOverride>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BodyLimitOverride {
    pub prefix: String,
    pub limit: Byte,
}

impl RouteOverride for BodyLimitOverride {
    fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl HttpBodyLimitConfig {
    fn default_limit() -> Byte {
        Byte::from_u64(1024 * 1024)
    }

    pub fn with_default_limit(mut self, limit: u64) -> Self {
        self.default_limit = Byte::from_u64(limit);
        self
    }

    pub fn with_route_override(mut self, prefix: impl Into<String>, limit: u64) -> Self {
        self.route_overrides.push(BodyLimitOverride {
            prefix: prefix.into(),
            limit: Byte::from_u64(limit),
        });
        self
    }

    /// Resolves the byte ceiling for a request path.
    pub fn limit_for(&self, path: &str) -> u64 {
        crate::utils::resolve_route_override(&self.route_overrides, path)
            .map(|o| o.limit)
            .unwrap_or(self.default_limit)
            .as_u64()
    }

    pub fn validate(&self) -> Result<()> {
        for o in &self.route_overrides {
            if !o.prefix.starts_with('/') {
                return Err(Error::config(format!(
                    "[http.body_limit] route override prefix '{}' must start with '/'.",
                    o.prefix
                )));
            }
        }
        Ok(())
    }
}

impl Default for HttpBodyLimitConfig {
    fn default() -> Self {
        Self {
            default_limit: Self::default_limit(),
            route_overrides: Vec::new(),
        }
    }
}
