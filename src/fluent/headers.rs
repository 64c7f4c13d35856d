//! Header limiter and header sanitizer gates.
//!
//! The limiter only inspects the header block. The sanitizer replaces it with a
//! filtered copy that every later gate and the handler see.

use {
    crate::{Error, HttpHeaderLimitsConfig, HttpHeaderSanitizerConfig, Result},
    axum::{
        extract::{Request, State},
        middleware::Next,
        response::Response,
    },
    http::{HeaderMap, header::TRANSFER_ENCODING},
    regex::Regex,
    std::{
        collections::HashSet,
        sync::{Arc, LazyLock},
    },
};

static HEADER_NAME_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9-]+$").unwrap());

// ============================================================================
// Header limiter
// ============================================================================

pub(crate) async fn limit_headers(
    State(limits): State<Arc<HttpHeaderLimitsConfig>>,
    req: Request,
    next: Next,
) -> Result<Response> {
    check_header_limits(&limits, req.headers())?;
    Ok(next.run(req).await)
}

/// Enforces count and size ceilings, then the chunked transfer encoding rule.
pub(crate) fn check_header_limits(limits: &HttpHeaderLimitsConfig, headers: &HeaderMap) -> Result<()> {
    if headers.len() > limits.max_header_count {
        return Err(Error::header_fields_too_large(format!(
            "Too many headers (limit = {}).",
            limits.max_header_count
        )));
    }

    let mut total = 0usize;
    for (name, value) in headers {
        let size = name.as_str().len() + value.len();
        if size > limits.max_single_header_bytes {
            return Err(Error::header_fields_too_large(format!(
                "Header exceeds per-header size limit ({} bytes).",
                limits.max_single_header_bytes
            )));
        }
        total += size;
    }

    if total > limits.max_total_header_bytes {
        return Err(Error::header_fields_too_large(format!(
            "Total header size exceeds limit ({} bytes).",
            limits.max_total_header_bytes
        )));
    }

    if !limits.allow_chunked && is_chunked(headers) {
        return Err(Error::unsupported_media_type(
            "Chunked request bodies are not allowed.",
        ));
    }

    Ok(())
}

fn is_chunked(headers: &HeaderMap) -> bool {
    headers.get_all(TRANSFER_ENCODING).iter().any(|v| {
        v.to_str()
            .map(|s| s.split(',').any(|enc| enc.trim().eq_ignore_ascii_case("chunked")))
            .unwrap_or(false)
    })
}

// ============================================================================
// Header sanitizer
// ============================================================================

/// Lower-cased block and allow lists ready for lookups.
#[derive(Debug, Clone)]
pub(crate) struct HeaderRules {
    blocked: HashSet<String>,
    allowed: HashSet<String>,
}

impl From<&HttpHeaderSanitizerConfig> for HeaderRules {
    fn from(config: &HttpHeaderSanitizerConfig) -> Self {
        Self {
            blocked: config.blocklist.iter().map(|n| n.to_ascii_lowercase()).collect(),
            allowed: config.allowlist.iter().map(|n| n.to_ascii_lowercase()).collect(),
        }
    }
}

pub(crate) async fn sanitize_headers(
    State(rules): State<Arc<HeaderRules>>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let filtered = sanitize(&rules, req.headers())?;
    *req.headers_mut() = filtered;
    Ok(next.run(req).await)
}

/// Validates every header and returns the allow-listed subset.
///
/// Checks run per header name in this order: block list, duplicates, name
/// characters, value control characters. The first violation wins.
pub(crate) fn sanitize(rules: &HeaderRules, headers: &HeaderMap) -> Result<HeaderMap> {
    let mut filtered = HeaderMap::with_capacity(headers.keys_len());

    for name in headers.keys() {
        let lower = name.as_str().to_ascii_lowercase();

        if rules.blocked.contains(&lower) {
            return Err(Error::bad_request(format!(
                "Header '{lower}' is not allowed."
            )));
        }

        let mut values = headers.get_all(name).iter();
        let (Some(value), None) = (values.next(), values.next()) else {
            return Err(Error::bad_request(format!(
                "Duplicate header '{lower}' is not permitted."
            )));
        };

        if !HEADER_NAME_REGEXP.is_match(&lower) {
            return Err(Error::bad_request(format!(
                "Header name '{lower}' contains invalid characters."
            )));
        }

        if has_control_chars(value.as_bytes()) {
            return Err(Error::bad_request(
                "Header value contains prohibited control characters.",
            ));
        }

        if rules.allowed.contains(&lower) {
            filtered.insert(name.clone(), value.clone());
        }
    }

    Ok(filtered)
}

fn has_control_chars(value: &[u8]) -> bool {
    value.iter().any(|b| *b == b'\r' || *b == b'\n')
}
