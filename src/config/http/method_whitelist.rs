use crate::{CorsMethod, Error, Result};
use http::Method;
use serde::Deserialize;

/// Methods the method whitelist admits. `HEAD` and `OPTIONS` always pass.
///
/// ```toml
/// [http.method_whitelist]
/// allowed = ["GET", "POST"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct HttpMethodWhitelistConfig {
    #[serde(default = "HttpMethodWhitelistConfig::default_allowed")]
    pub allowed: Vec<CorsMethod>,
}

impl HttpMethodWhitelistConfig {
    fn default_allowed() -> Vec<CorsMethod> {
        [
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ]
        .into_iter()
        .map(CorsMethod)
        .collect()
    }

    pub fn with_allowed(mut self, methods: Vec<Method>) -> Self {
        self.allowed = methods.into_iter().map(CorsMethod).collect();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.allowed.is_empty() {
            return Err(Error::config(
                "[http.method_whitelist] allowed must list at least one method.",
            ));
        }
        Ok(())
    }
}

impl Default for HttpMethodWhitelistConfig {
    fn default() -> Self {
        Self {
            allowed: Self::default_allowed(),
        }
    }
}
