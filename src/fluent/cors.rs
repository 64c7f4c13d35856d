use {
    crate::{CorsOrigin, Error, HttpCorsConfig, Result},
    axum::{
        extract::{Request, State},
        middleware::Next,
        response::{IntoResponse, Response},
    },
    http::{
        HeaderMap, HeaderValue, Method, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
            ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE, ORIGIN, VARY,
        },
    },
    std::sync::Arc,
};

/// CORS settings turned into ready-made header values.
#[derive(Debug, Clone)]
pub(crate) struct CorsPolicy {
    origins: CorsOrigin,
    credentials: bool,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
    expose_headers: Option<HeaderValue>,
    max_age: Option<HeaderValue>,
}

impl TryFrom<&HttpCorsConfig> for CorsPolicy {
    type Error = Error;

    fn try_from(config: &HttpCorsConfig) -> Result<Self> {
        let allow_methods = join(config.allowed_methods.iter().map(|m| m.0.as_str()));
        let allow_headers = join(config.allowed_headers.iter().map(|h| h.0.as_str()));
        let expose_headers = join(config.exposed_headers.iter().map(|h| h.0.as_str()));

        Ok(Self {
            origins: config.allowed_origins.clone(),
            credentials: config.allow_credentials,
            allow_methods: HeaderValue::from_str(&allow_methods)?,
            allow_headers: HeaderValue::from_str(&allow_headers)?,
            expose_headers: if expose_headers.is_empty() {
                None
            } else {
                Some(HeaderValue::from_str(&expose_headers)?)
            },
            max_age: config.max_age.map(|age| HeaderValue::from(age.as_secs())),
        })
    }
}

fn join<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items.collect::<Vec<_>>().join(", ")
}

impl CorsPolicy {
    fn apply(&self, headers: &mut HeaderMap, origin: HeaderValue) {
        if self.origins.is_any() && !self.credentials {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        } else {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
            headers.append(VARY, HeaderValue::from_static("Origin"));
        }
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
        if let Some(expose) = &self.expose_headers {
            headers.insert(ACCESS_CONTROL_EXPOSE_HEADERS, expose.clone());
        }
        if let Some(max_age) = &self.max_age {
            headers.insert(ACCESS_CONTROL_MAX_AGE, max_age.clone());
        }
        if self.credentials {
            headers.insert(
                ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
    }
}

/// Requests without an `Origin` pass untouched. Every `OPTIONS` ends here with
/// 204, carrying CORS headers only when an allowed `Origin` was sent.
pub(crate) async fn cors(
    State(policy): State<Arc<CorsPolicy>>,
    req: Request,
    next: Next,
) -> Result<Response> {
    let Some(origin) = req.headers().get(ORIGIN).cloned() else {
        if req.method() == Method::OPTIONS {
            return Ok(StatusCode::NO_CONTENT.into_response());
        }
        return Ok(next.run(req).await);
    };

    let allowed = origin
        .to_str()
        .is_ok_and(|origin| policy.origins.matches(origin));
    if !allowed {
        return Err(Error::forbidden(format!(
            "CORS origin '{}' not allowed.",
            String::from_utf8_lossy(origin.as_bytes())
        )));
    }

    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };
    policy.apply(response.headers_mut(), origin);
    Ok(response)
}
