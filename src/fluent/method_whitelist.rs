use {
    crate::{Error, HttpMethodWhitelistConfig, Result},
    axum::{
        extract::{Request, State},
        middleware::Next,
        response::Response,
    },
    http::Method,
    std::sync::Arc,
};

/// Allowed method names plus the ready-made rejection message.
#[derive(Debug, Clone)]
pub(crate) struct MethodWhitelist {
    allowed: Vec<Method>,
    listing: String,
}

impl From<&HttpMethodWhitelistConfig> for MethodWhitelist {
    fn from(config: &HttpMethodWhitelistConfig) -> Self {
        let allowed: Vec<Method> = config.allowed.iter().map(|m| m.0.clone()).collect();
        let listing = allowed
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        Self { allowed, listing }
    }
}

impl MethodWhitelist {
    pub(crate) fn check(&self, method: &Method) -> Result<()> {
        if *method == Method::HEAD || *method == Method::OPTIONS {
            return Ok(());
        }
        if self
            .allowed
            .iter()
            .any(|m| m.as_str().eq_ignore_ascii_case(method.as_str()))
        {
            return Ok(());
        }
        Err(Error::method_not_allowed(format!(
            "HTTP method '{method}' is not allowed. Allowed methods: {}.",
            self.listing
        )))
    }
}

pub(crate) async fn check_method(
    State(whitelist): State<Arc<MethodWhitelist>>,
    req: Request,
    next: Next,
) -> Result<Response> {
    whitelist.check(req.method())?;
    Ok(next.run(req).await)
}
