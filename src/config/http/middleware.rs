use crate::{Error, Result};
use serde::Deserialize;

/// Selects which gates [`crate::FluentRouter::setup_middleware`] installs.
///
/// Declared directly in the `[http]` table:
///
/// ```toml
/// [http]
/// exclude = ["rate-limiting", "metrics"]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMiddlewareConfig {
    Include(Vec<HttpMiddleware>),
    Exclude(Vec<HttpMiddleware>),
}

impl HttpMiddlewareConfig {
    pub fn is_enabled(&self, middleware: HttpMiddleware) -> bool {
        match self {
            HttpMiddlewareConfig::Include(list) => list.contains(&middleware),
            HttpMiddlewareConfig::Exclude(list) => !list.contains(&middleware),
        }
    }

    /// Validates middleware dependencies are satisfied.
    ///
    /// # Dependencies
    ///
    /// - `Logging` and `Metrics` read the request id and must run inside `RequestContext`
    pub fn validate(&self) -> Result<()> {
        for dependent in [HttpMiddleware::Logging, HttpMiddleware::Metrics] {
            if self.is_enabled(dependent) && !self.is_enabled(HttpMiddleware::RequestContext) {
                return Err(Error::config(format!(
                    "{dependent:?} requires RequestContext. Remove 'request-context' from the exclude list or add it to the include list.",
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum HttpMiddleware {
    RequestContext,
    Logging,
    Metrics,
    Liveness,
    Readiness,
    Timeout,
    SecurityHeaders,
    Cors,
    RateLimiting,
    MethodWhitelist,
    HeaderLimits,
    HeaderSanitizer,
    ContentType,
    BodyLimit,
    CatchPanic,
}
