use crate::{Error, Result, utils::RouteOverride};
use serde::Deserialize;

/// Media types accepted on body-bearing requests.
///
/// ```toml
/// [http.content_type]
/// default_allowed = ["application/json"]
///
/// [[http.content_type.route_overrides]]
/// prefix = "/uploads"
/// allowed = ["multipart/form-data"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct HttpContentTypeConfig {
    #[serde(default = "HttpContentTypeConfig::default_allowed")]
    pub default_allowed: Vec<String>,

    #[serde(default)]
    pub route_overrides: Vec<ContentTypeOverride>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentTypeOverride {
    pub prefix: String,
    pub allowed: Vec<String>,
}

impl RouteOverride for ContentTypeOverride {
    fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl HttpContentTypeConfig {
    fn default_allowed() -> Vec<String> {
        vec!["application/json".into()]
    }

    pub fn with_default_allowed(mut self, allowed: Vec<String>) -> Self {
        self.default_allowed = allowed;
        self
    }

    pub fn with_route_override(mut self, prefix: impl Into<String>, allowed: Vec<String>) -> Self {
        self.route_overrides.push(ContentTypeOverride {
            prefix: prefix.into(),
            allowed,
        });
        self
    }

    /// Resolves the allowed media types for a request path.
    pub fn allowed_for(&self, path: &str) -> &[String] {
        crate::utils::resolve_route_override(&self.route_overrides, path)
            .map(|o| o.allowed.as_slice())
            .unwrap_or(&self.default_allowed)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_allowed.is_empty() {
            return Err(Error::config(
                "[http.content_type] default_allowed must list at least one media type.",
            ));
        }
        for o in &self.route_overrides {
            if !o.prefix.starts_with('/') {
                return Err(Error::config(format!(
                    "[http.content_type] route override prefix '{}' must start with '/'.",
                    o.prefix
                )));
            }
        }
        Ok(())
    }
}

impl Default for HttpContentTypeConfig {
    fn default() -> Self {
        Self {
            default_allowed: Self::default_allowed(),
            route_overrides: Vec::new(),
        }
    }
}
