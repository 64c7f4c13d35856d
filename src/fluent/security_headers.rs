use {
    crate::{HttpSecurityHeadersConfig, Result},
    axum::{
        extract::{Request, State},
        middleware::Next,
        response::Response,
    },
    http::{
        HeaderMap, HeaderName, HeaderValue,
        header::{
            CONTENT_SECURITY_POLICY, REFERRER_POLICY, STRICT_TRANSPORT_SECURITY,
            X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS, X_XSS_PROTECTION,
        },
    },
    std::sync::Arc,
};

const CROSS_ORIGIN_OPENER_POLICY: HeaderName = HeaderName::from_static("cross-origin-opener-policy");
const CROSS_ORIGIN_EMBEDDER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-embedder-policy");
const CROSS_ORIGIN_RESOURCE_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-resource-policy");
const PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");

/// The header bundle written on every response.
#[derive(Debug, Clone)]
pub(crate) struct SecurityHeaders {
    strip: Vec<HeaderName>,
    common: Vec<(HeaderName, HeaderValue)>,
    /// Skipped on documentation routes.
    framing: Vec<(HeaderName, HeaderValue)>,
    docs_routes: Vec<String>,
}

impl TryFrom<&HttpSecurityHeadersConfig> for SecurityHeaders {
    type Error = crate::Error;

    fn try_from(config: &HttpSecurityHeadersConfig) -> Result<Self> {
        let mut common = Vec::new();
        if config.x_content_type_nosniff {
            common.push((X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")));
        }
        for (name, value) in [
            (REFERRER_POLICY, &config.referrer_policy),
            (X_XSS_PROTECTION, &config.x_xss_protection),
            (STRICT_TRANSPORT_SECURITY, &config.strict_transport_security),
            (CROSS_ORIGIN_OPENER_POLICY, &config.cross_origin_opener_policy),
            (CROSS_ORIGIN_EMBEDDER_POLICY, &config.cross_origin_embedder_policy),
            (CROSS_ORIGIN_RESOURCE_POLICY, &config.cross_origin_resource_policy),
            (PERMISSIONS_POLICY, &config.permissions_policy),
        ] {
            // An empty value turns the header off
            if !value.is_empty() {
                common.push((name, HeaderValue::from_str(value)?));
            }
        }

        let mut framing = vec![(
            X_FRAME_OPTIONS,
            HeaderValue::from_str(&config.x_frame_options.to_string())?,
        )];
        if !config.content_security_policy.is_empty() {
            framing.push((
                CONTENT_SECURITY_POLICY,
                HeaderValue::from_str(&config.content_security_policy)?,
            ));
        }

        let strip = config
            .strip_headers
            .iter()
            .map(|name| HeaderName::try_from(name.as_str()))
            .collect::<std::result::Result<_, _>>()?;

        Ok(Self {
            strip,
            common,
            framing,
            docs_routes: config.docs_routes.clone(),
        })
    }
}

impl SecurityHeaders {
    fn is_docs_route(&self, path: &str) -> bool {
        self.docs_routes.iter().any(|r| path.starts_with(r.as_str()))
    }

    fn apply(&self, headers: &mut HeaderMap, docs_route: bool) {
        for name in &self.strip {
            headers.remove(name);
        }
        for (name, value) in &self.common {
            headers.insert(name.clone(), value.clone());
        }
        if !docs_route {
            for (name, value) in &self.framing {
                headers.insert(name.clone(), value.clone());
            }
        }
    }
}

pub(crate) async fn security_headers(
    State(bundle): State<Arc<SecurityHeaders>>,
    req: Request,
    next: Next,
) -> Response {
    let docs_route = bundle.is_docs_route(req.uri().path());
    let mut response = next.run(req).await;
    bundle.apply(response.headers_mut(), docs_route);
    response
}
