use crate::{Error, Result};
use serde::Deserialize;

const DEFAULT_BLOCKLIST: &[&str] = &[
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "proxy-connection",
    "x-forwarded-for",
    "x-forwarded-host",
    "x-forwarded-proto",
    "forwarded",
    "via",
    "client-ip",
    "true-client-ip",
];

const DEFAULT_ALLOWLIST: &[&str] = &[
    "host",
    "connection",
    "content-type",
    "content-length",
    "accept",
    "accept-language",
    "accept-encoding",
    "user-agent",
    "referer",
    "origin",
    "cookie",
    "sec-fetch-site",
    "sec-fetch-mode",
    "sec-fetch-dest",
    "sec-ch-ua",
    "sec-ch-ua-mobile",
    "sec-ch-ua-platform",
    "authorization",
    "x-csrf-token",
    "x-request-id",
    "x-api-key",
];

/// Header names the sanitizer rejects or keeps.
///
/// Blocked names fail the request. Names that are neither blocked nor allowed
/// are silently removed before the request reaches later gates.
///
/// ```toml
/// [http.header_sanitizer]
/// allowlist = ["host", "content-type", "content-length", "x-tenant-id"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct HttpHeaderSanitizerConfig {
    #[serde(default = "HttpHeaderSanitizerConfig::default_blocklist")]
    pub blocklist: Vec<String>,

    #[serde(default = "HttpHeaderSanitizerConfig::default_allowlist")]
    pub allowlist: Vec<String>,
}

impl HttpHeaderSanitizerConfig {
    fn default_blocklist() -> Vec<String> {
        DEFAULT_BLOCKLIST.iter().map(|s| s.to_string()).collect()
    }

    fn default_allowlist() -> Vec<String> {
        DEFAULT_ALLOWLIST.iter().map(|s| s.to_string()).collect()
    }

    /// Adds names to the allowlist on top of the current entries.
    pub fn with_allowed_headers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowlist.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_blocklist(mut self, names: Vec<String>) -> Self {
        self.blocklist = names;
        self
    }

    pub fn validate(&self) -> Result<()> {
        for name in &self.allowlist {
            if self.blocklist.iter().any(|b| b.eq_ignore_ascii_case(name)) {
                return Err(Error::config(format!(
                    "[http.header_sanitizer] header '{name}' cannot be both allowed and blocked.",
                )));
            }
        }
        Ok(())
    }
}

impl Default for HttpHeaderSanitizerConfig {
    fn default() -> Self {
        Self {
            blocklist: Self::default_blocklist(),
            allowlist: Self::default_allowlist(),
        }
    }
}
