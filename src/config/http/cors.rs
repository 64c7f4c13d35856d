use crate::{Error, Result};
use http::{HeaderName, Method};
use serde::Deserialize;
use std::{str::FromStr, time::Duration};

/// Configuration of the CORS gate.
///
/// ```toml
/// [http.cors]
/// allowed_origins = ["https://app.example.com", "https://admin.example.com"]
/// allowed_methods = ["GET", "POST"]
/// allowed_headers = ["Content-Type", "Authorization"]
/// exposed_headers = ["X-Request-Id"]
/// allow_credentials = true
/// max_age = "10m"
/// ```
///
/// `allowed_origins` also accepts a single string, and `"*"` for any origin.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpCorsConfig {
    #[serde(default)]
    pub allowed_origins: CorsOrigin,

    #[serde(default = "HttpCorsConfig::default_allowed_methods")]
    pub allowed_methods: Vec<CorsMethod>,

    #[serde(default = "HttpCorsConfig::default_allowed_headers")]
    pub allowed_headers: Vec<CorsHeader>,

    #[serde(default)]
    pub exposed_headers: Vec<CorsHeader>,

    #[serde(default)]
    pub allow_credentials: bool,

    #[serde(default, with = "humantime_serde")]
    pub max_age: Option<Duration>,
}

impl Default for HttpCorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: CorsOrigin::default(),
            allowed_methods: Self::default_allowed_methods(),
            allowed_headers: Self::default_allowed_headers(),
            exposed_headers: Vec::new(),
            allow_credentials: false,
            max_age: None,
        }
    }
}

impl HttpCorsConfig {
    fn default_allowed_methods() -> Vec<CorsMethod> {
        [
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ]
        .into_iter()
        .map(CorsMethod)
        .collect()
    }

    fn default_allowed_headers() -> Vec<CorsHeader> {
        vec![
            CorsHeader(http::header::CONTENT_TYPE),
            CorsHeader(http::header::AUTHORIZATION),
        ]
    }

    pub fn with_allow_credentials(mut self) -> Self {
        self.allow_credentials = true;
        self
    }

    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = CorsOrigin::from_list(origins);
        self
    }

    pub fn with_allowed_methods(mut self, methods: Vec<CorsMethod>) -> Self {
        self.allowed_methods = methods;
        self
    }

    pub fn with_allowed_headers(mut self, headers: Vec<CorsHeader>) -> Self {
        self.allowed_headers = headers;
        self
    }

    pub fn with_exposed_headers(mut self, headers: Vec<CorsHeader>) -> Self {
        self.exposed_headers = headers;
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn validate(&self) -> Result<()> {
        let origins: &[String] = match &self.allowed_origins {
            CorsOrigin::Any => &[],
            CorsOrigin::Exact(origin) => std::slice::from_ref(origin),
            CorsOrigin::List(origins) => origins,
        };

        for origin in origins {
            let url = url::Url::parse(origin)?;
            if url.origin().ascii_serialization() != *origin {
                return Err(Error::config(format!(
                    "CORS origin '{origin}' must be of the form scheme://host[:port] without a path.",
                )));
            }
        }

        if matches!(&self.allowed_origins, CorsOrigin::List(list) if list.is_empty()) {
            return Err(Error::config(
                "[http.cors] allowed_origins must not be empty. Use \"*\" to allow any origin.",
            ));
        }

        Ok(())
    }
}

/// Which origins the CORS gate accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CorsOrigin {
    /// `"*"`: every origin.
    #[default]
    Any,
    /// A single origin compared by exact string match.
    Exact(String),
    /// A set of origins.
    List(Vec<String>),
}

impl CorsOrigin {
    fn from_list(origins: Vec<String>) -> Self {
        if origins.iter().any(|o| o == "*") {
            CorsOrigin::Any
        } else if origins.len() == 1 {
            CorsOrigin::Exact(origins.into_iter().next().unwrap_or_default())
        } else {
            CorsOrigin::List(origins)
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, CorsOrigin::Any)
    }

    pub fn matches(&self, origin: &str) -> bool {
        match self {
            CorsOrigin::Any => true,
            CorsOrigin::Exact(allowed) => allowed == origin,
            CorsOrigin::List(allowed) => allowed.iter().any(|a| a == origin),
        }
    }
}

impl<'de> Deserialize<'de> for CorsOrigin {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One(String),
            Many(Vec<String>),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::One(origin) => CorsOrigin::from_list(vec![origin]),
            Raw::Many(origins) => CorsOrigin::from_list(origins),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsMethod(pub Method);

impl<'de> Deserialize<'de> for CorsMethod {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let method = Method::from_str(&s.to_uppercase()).map_err(serde::de::Error::custom)?;
        Ok(CorsMethod(method))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsHeader(pub HeaderName);

impl<'de> Deserialize<'de> for CorsHeader {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let header = HeaderName::from_str(&s).map_err(serde::de::Error::custom)?;
        Ok(CorsHeader(header))
    }
}
