use {
    crate::{Error, Result, context},
    serde::Deserialize,
    std::{any::Any, panic::Location},
    tracing_subscriber::EnvFilter,
};

/// Log output settings.
///
/// ```toml
/// [logging]
/// format = "json"
/// level = "info,axum_gatekeeper=debug"
/// ```
///
/// `RUST_LOG`, when set, takes precedence over `level`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,

    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".into()
    }

    pub fn validate(&self) -> Result<()> {
        EnvFilter::try_new(&self.level)
            .map(|_| ())
            .map_err(|e| Error::config(format!("[logging] level is invalid: {e}")))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Default,
    Compact,
    Pretty,
}

/// Text of a panic payload, for the two payload types `panic!` produces.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Logs a panic and returns `true` when it must end the process.
///
/// Panics inside a request context are answered with a `500` by the
/// panic-catching gate and are only logged at debug here.
pub(crate) fn log_panic(message: &str, location: Option<&Location<'_>>) -> bool {
    let location = location.map(ToString::to_string).unwrap_or_default();

    if context::is_active() {
        tracing::debug!(location, "Request panicked — {message}");
        return false;
    }

    tracing::error!(location, "Uncaught panic — {message}");
    tracing::error!("Fatal error caused by uncaught panic — forcing exit");
    true
}
