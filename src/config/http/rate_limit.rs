use crate::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

/// Sliding-window rate limiting per client key.
///
/// ```toml
/// [http.rate_limit]
/// window = "60s"
/// max = 100
/// cleanup_interval = "60s"
/// ```
///
/// Setting `max = 0` disables the gate.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpRateLimitConfig {
    #[serde(default = "HttpRateLimitConfig::default_window", with = "humantime_serde")]
    pub window: Duration,

    #[serde(default = "HttpRateLimitConfig::default_max")]
    pub max: u32,

    /// How often keys without activity inside the window are dropped.
    #[serde(
        default = "HttpRateLimitConfig::default_cleanup_interval",
        with = "humantime_serde"
    )]
    pub cleanup_interval: Duration,
}

impl HttpRateLimitConfig {
    fn default_window() -> Duration {
        Duration::from_secs(60)
    }

    fn default_max() -> u32 {
        100
    }

    fn default_cleanup_interval() -> Duration {
        Duration::from_secs(60)
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_max(mut self, max: u32) -> Self {
        self.max = max;
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.max > 0
    }

    /// Window length in whole seconds, rounded up, as sent in `Retry-After`.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.window.as_secs();
        if self.window.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.window.is_zero() {
            return Err(Error::config("[http.rate_limit] window must be > 0."));
        }
        if self.cleanup_interval.is_zero() {
            return Err(Error::config(
                "[http.rate_limit] cleanup_interval must be > 0.",
            ));
        }
        Ok(())
    }
}

impl Default for HttpRateLimitConfig {
    fn default() -> Self {
        Self {
            window: Self::default_window(),
            max: Self::default_max(),
            cleanup_interval: Self::default_cleanup_interval(),
        }
    }
}
