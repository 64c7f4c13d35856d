//!
//! Configuration structures for the server and every gate of the pipeline.
//!
//! A configuration can be created in many ways:
//! - From an environment-specific TOML file via `Config::from_rust_env` or `Config::from_toml_file`
//! - From a TOML string via `Config::from_toml` or `str::parse`
//! - Constructed programmatically via the builder methods on `Config`
//!
//! In both TOML-based methods, environment variables can be referenced in the TOML
//! using the {{ VAR_NAME }} syntax, and they will be substituted with the corresponding
//! environment variable value.
//!
//! Configuration is split into logical sections, each represented by their own struct:
//!
//! - `HttpConfig` for the server and the gates (`[http]`, `[http.cors]`, ...)
//! - `LoggingConfig` for log format and level
//!
mod http;
mod logging;

pub use http::*;
pub use logging::*;

pub use byte_unit::Byte;

use {
    crate::{Error, Result, utils::replace_handlebars_with_env},
    serde::Deserialize,
    std::{env, fs, str::FromStr, sync::Once, time::Duration},
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    ///
    /// Creates a default configuration.
    /// This will attempt to load configuration from the file based on the RUST_ENV
    /// environment variable falling back to a default configuration if the environment
    /// variable is not set or the file cannot be read.
    ///
    fn default() -> Self {
        match Self::from_rust_env() {
            Ok(config) => config,
            Err(_) => Config {
                http: HttpConfig::default(),
                logging: LoggingConfig::default(),
            },
        }
    }
}

impl Config {
    /// Loads `config/{RUST_ENV}.toml`.
    pub fn from_rust_env() -> Result<Config> {
        Self::from_toml_file(env::var("RUST_ENV")?)
    }

    /// Loads `config/{env}.toml`.
    pub fn from_toml_file(env: impl AsRef<str>) -> Result<Config> {
        let path = format!("config/{}.toml", env.as_ref());
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(toml_str: &str) -> Result<Config> {
        toml_str.parse()
    }

    pub fn with_bind_addr<S: AsRef<str>>(mut self, addr: S) -> Self {
        self.http.bind_addr = addr.as_ref().into();
        self
    }

    pub fn with_bind_port(mut self, port: u16) -> Self {
        self.http.bind_port = port;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.http.request_timeout = Some(timeout);
        self
    }

    pub fn with_metrics(mut self, enable: bool) -> Self {
        self.http.with_metrics = enable;
        self
    }

    pub fn with_metrics_route(mut self, route: &str) -> Self {
        self.http.metrics_route = route.into();
        self
    }

    pub fn with_liveness_route(mut self, route: &str) -> Self {
        self.http.liveness_route = route.into();
        self
    }

    pub fn with_readiness_route(mut self, route: &str) -> Self {
        self.http.readiness_route = route.into();
        self
    }

    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.logging.format = format;
        self
    }

    pub fn with_header_limits(mut self, limits: HttpHeaderLimitsConfig) -> Self {
        self.http.header_limits = limits;
        self
    }

    pub fn with_header_sanitizer(mut self, sanitizer: HttpHeaderSanitizerConfig) -> Self {
        self.http.header_sanitizer = sanitizer;
        self
    }

    pub fn with_content_type_config(mut self, content_type: HttpContentTypeConfig) -> Self {
        self.http.content_type = content_type;
        self
    }

    pub fn with_body_limit_config(mut self, body_limit: HttpBodyLimitConfig) -> Self {
        self.http.body_limit = body_limit;
        self
    }

    pub fn with_method_whitelist(mut self, whitelist: HttpMethodWhitelistConfig) -> Self {
        self.http.method_whitelist = whitelist;
        self
    }

    pub fn with_rate_limit_config(mut self, rate_limit: HttpRateLimitConfig) -> Self {
        self.http.rate_limit = rate_limit;
        self
    }

    pub fn with_cors_config(mut self, cors_config: HttpCorsConfig) -> Self {
        self.http.cors = cors_config;
        self
    }

    pub fn with_security_headers(mut self, security_headers: HttpSecurityHeadersConfig) -> Self {
        self.http.security_headers = security_headers;
        self
    }

    pub fn with_included_middlewares(mut self, middlewares: Vec<HttpMiddleware>) -> Self {
        self.http.middleware = Some(HttpMiddlewareConfig::Include(middlewares));
        self
    }

    pub fn with_excluded_middlewares(mut self, middlewares: Vec<HttpMiddleware>) -> Self {
        self.http.middleware = Some(HttpMiddlewareConfig::Exclude(middlewares));
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.http.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Installs the global tracing subscriber.
    ///
    /// The filter comes from `RUST_LOG` when set, otherwise from `[logging] level`.
    /// Calling this more than once is harmless: later calls are ignored.
    pub fn setup_tracing(&self) {
        use tracing_subscriber::{EnvFilter, prelude::*};
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.logging.level))
            .unwrap_or_else(|_| EnvFilter::new("info"));
        match self.logging.format {
            LogFormat::Json => {
                let _ = tracing_subscriber::registry()
                    .with(tracing_subscriber::fmt::layer().json())
                    .with(env_filter)
                    .try_init();
            }
            LogFormat::Default => {
                let _ = tracing_subscriber::registry()
                    .with(tracing_subscriber::fmt::layer())
                    .with(env_filter)
                    .try_init();
            }
            LogFormat::Compact => {
                let _ = tracing_subscriber::registry()
                    .with(tracing_subscriber::fmt::layer().compact())
                    .with(env_filter)
                    .try_init();
            }
            LogFormat::Pretty => {
                let _ = tracing_subscriber::registry()
                    .with(tracing_subscriber::fmt::layer().pretty())
                    .with(env_filter)
                    .try_init();
            }
        }
    }

    /// Installs a panic hook that logs every panic through `tracing`.
    ///
    /// A panic outside any request, for instance in a background task or in a
    /// task spawned from a handler without [`crate::context::scope_current`],
    /// ends the process with exit code `1`. Panics inside a request are
    /// answered with a `500` by the panic-catching gate and leave the process
    /// running. Call after [`Config::setup_tracing`]; later calls are ignored.
    pub fn setup_fatal_handlers(&self) {
        static INSTALLED: Once = Once::new();
        INSTALLED.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                if logging::log_panic(logging::panic_message(info.payload()), info.location()) {
                    std::process::exit(1);
                }
            }));
        });
    }
}

impl FromStr for Config {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let config_file = replace_handlebars_with_env(s);
        let config = toml::from_str::<Config>(&config_file)?;
        Ok(config)
    }
}
