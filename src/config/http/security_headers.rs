use crate::Result;
use http::{HeaderName, HeaderValue};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum XFrameOptions {
    #[default]
    Deny,
    SameOrigin,
    AllowFrom(String),
}

impl fmt::Display for XFrameOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XFrameOptions::Deny => write!(f, "DENY"),
            XFrameOptions::SameOrigin => write!(f, "SAMEORIGIN"),
            XFrameOptions::AllowFrom(url) => write!(f, "ALLOW-FROM {}", url),
        }
    }
}

impl<'de> Deserialize<'de> for XFrameOptions {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.to_uppercase().as_str() {
            "DENY" => XFrameOptions::Deny,
            "SAMEORIGIN" => XFrameOptions::SameOrigin,
            _ => XFrameOptions::AllowFrom(s),
        })
    }
}

/// Hardening headers written on every response.
///
/// Paths starting with one of `docs_routes` skip the CSP and frame headers so
/// interactive API documentation keeps working.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSecurityHeadersConfig {
    pub x_frame_options: XFrameOptions,
    pub x_content_type_nosniff: bool,
    pub referrer_policy: String,
    pub x_xss_protection: String,
    pub strict_transport_security: String,
    pub cross_origin_opener_policy: String,
    pub cross_origin_embedder_policy: String,
    pub cross_origin_resource_policy: String,
    pub permissions_policy: String,
    pub content_security_policy: String,
    pub docs_routes: Vec<String>,
    /// Response headers removed because they identify the server stack.
    pub strip_headers: Vec<String>,
}

impl Default for HttpSecurityHeadersConfig {
    fn default() -> Self {
        Self {
            x_frame_options: XFrameOptions::Deny,
            x_content_type_nosniff: true,
            referrer_policy: "strict-origin-when-cross-origin".into(),
            x_xss_protection: "0".into(),
            strict_transport_security: "max-age=63072000; includeSubDomains; preload".into(),
            cross_origin_opener_policy: "same-origin".into(),
            cross_origin_embedder_policy: "require-corp".into(),
            cross_origin_resource_policy: "same-origin".into(),
            permissions_policy: "geolocation=(), microphone=(), camera=()".into(),
            content_security_policy: "default-src 'self'; img-src 'self' data:; object-src 'none'; frame-ancestors 'none'; base-uri 'self'".into(),
            docs_routes: vec!["/docs".into(), "/openapi.json".into()],
            strip_headers: vec!["x-powered-by".into(), "server".into()],
        }
    }
}

impl HttpSecurityHeadersConfig {
    pub fn with_x_frame_options(mut self, x_frame: XFrameOptions) -> Self {
        self.x_frame_options = x_frame;
        self
    }

    pub fn with_content_security_policy(mut self, csp: impl Into<String>) -> Self {
        self.content_security_policy = csp.into();
        self
    }

    pub fn with_docs_routes(mut self, routes: Vec<String>) -> Self {
        self.docs_routes = routes;
        self
    }

    pub fn is_docs_route(&self, path: &str) -> bool {
        self.docs_routes.iter().any(|r| path.starts_with(r.as_str()))
    }

    pub fn validate(&self) -> Result<()> {
        HeaderValue::from_str(&self.x_frame_options.to_string())?;
        for value in [
            &self.referrer_policy,
            &self.x_xss_protection,
            &self.strict_transport_security,
            &self.cross_origin_opener_policy,
            &self.cross_origin_embedder_policy,
            &self.cross_origin_resource_policy,
            &self.permissions_policy,
            &self.content_security_policy,
        ] {
            HeaderValue::from_str(value)?;
        }
        for name in &self.strip_headers {
            HeaderName::try_from(name.as_str())?;
        }
        Ok(())
    }
}
