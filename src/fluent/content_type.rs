use {
    crate::{Error, HttpContentTypeConfig, Result},
    axum::{
        extract::{Request, State},
        middleware::Next,
        response::Response,
    },
    http::{HeaderMap, Method, header::CONTENT_TYPE},
    std::sync::Arc,
};

pub(crate) async fn check_content_type(
    State(config): State<Arc<HttpContentTypeConfig>>,
    req: Request,
    next: Next,
) -> Result<Response> {
    validate(&config, req.method(), req.uri().path(), req.headers())?;
    Ok(next.run(req).await)
}

/// Applies the body rules of `method` to the request's `Content-Type`.
pub(crate) fn validate(
    config: &HttpContentTypeConfig,
    method: &Method,
    path: &str,
    headers: &HeaderMap,
) -> Result<()> {
    let content_type = headers.get(CONTENT_TYPE);

    match *method {
        Method::GET | Method::DELETE | Method::HEAD | Method::OPTIONS => {
            if content_type.is_some() {
                return Err(Error::unsupported_media_type(format!(
                    "HTTP method '{method}' does not accept a request body."
                )));
            }
        }
        Method::POST | Method::PUT | Method::PATCH => {
            let Some(content_type) = content_type else {
                return Err(Error::unsupported_media_type("Missing Content-Type header."));
            };

            let media_type = media_type(content_type.to_str().unwrap_or_default());
            let allowed = config.allowed_for(path);
            if !allowed.iter().any(|a| a.eq_ignore_ascii_case(&media_type)) {
                let mut expected = allowed.to_vec();
                expected.sort();
                return Err(Error::unsupported_media_type(format!(
                    "Content-Type '{media_type}' is not allowed on this endpoint. Expected one of: {}.",
                    expected.join(", ")
                )));
            }
        }
        _ => {}
    }

    Ok(())
}

/// `Application/JSON; charset=utf-8` becomes `application/json`.
fn media_type(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
