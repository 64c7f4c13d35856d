//! Error types and the uniform error envelope.
//!
//! Every gate rejects a request by returning an [`Error`]. Its `IntoResponse`
//! implementation is the single place where rejections become HTTP responses,
//! so all of them share the same JSON shape:
//!
//! ```json
//! {
//!   "status": 429,
//!   "message": "Too many requests — limit is 100 per 60s.",
//!   "timestamp": "2024-05-01T12:00:00.000Z"
//! }
//! ```
//!
//! # Design
//!
//! This module uses an opaque `Error` struct paired with an `ErrorKind` enum,
//! following the `std::io::Error` pattern. Gates that need to decorate the
//! rejection (e.g. `Retry-After`) attach headers with [`Error::with_header`].
//!
//! # Example
//!
//! ```rust
//! use axum_gatekeeper::{Error, ErrorKind};
//! use axum::http::StatusCode;
//!
//! let error = Error::method_not_allowed("HTTP method 'TRACE' is not allowed.");
//! assert_eq!(error.kind(), ErrorKind::MethodNotAllowed);
//! assert_eq!(error.status_code(), StatusCode::METHOD_NOT_ALLOWED);
//! ```

use axum::{
    Json,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::{fmt, time::SystemTime};
use thiserror::Error;

/// Message surfaced to clients for every server-side failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// The kind of error that occurred.
///
/// Client-facing kinds map one-to-one onto the HTTP status a gate rejects
/// with. The remaining kinds describe failures of the service itself and are
/// never shown to clients in detail.
///
/// # Stability
///
/// This enum is marked `#[non_exhaustive]`, so new variants may be added
/// in future versions without breaking existing code. Always include a
/// wildcard arm when matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Malformed, blocked or duplicate headers.
    #[error("bad request")]
    BadRequest,

    /// CORS origin rejected.
    #[error("forbidden")]
    Forbidden,

    /// No route matched the request.
    #[error("not found")]
    NotFound,

    /// Method outside the configured whitelist.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// The global request deadline elapsed.
    #[error("request timeout")]
    RequestTimeout,

    /// The request body exceeded its byte ceiling.
    #[error("payload too large")]
    PayloadTooLarge,

    /// Content-Type missing, not allowed, present on a body-less method, or a
    /// forbidden transfer encoding.
    #[error("unsupported media type")]
    UnsupportedMediaType,

    /// Rate limit exceeded.
    #[error("too many requests")]
    TooManyRequests,

    /// Header count or size ceilings exceeded.
    #[error("request header fields too large")]
    RequestHeaderFieldsTooLarge,

    /// Configuration error (invalid TOML, invalid values).
    #[error("configuration error")]
    Configuration,

    /// I/O error (binding sockets, reading files).
    #[error("I/O error")]
    Io,

    /// Internal/unexpected error.
    #[error("internal error")]
    Internal,
}

impl ErrorKind {
    /// Returns `true` for kinds that describe a failure of the service rather
    /// than a rejected request.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            ErrorKind::Configuration | ErrorKind::Io | ErrorKind::Internal
        )
    }
}

/// An error raised by a gate or by the service itself.
///
/// This is an opaque error type that wraps an underlying error source.
/// Use [`Error::kind()`] to determine the category of error for matching,
/// and the `Display` implementation to get the human-readable message.
///
/// # Creating Errors
///
/// ```rust
/// use axum_gatekeeper::Error;
///
/// let err = Error::bad_request("Header 'via' is not allowed.");
/// let err = Error::too_many_requests("Too many requests — limit is 5 per 1s.")
///     .with_header(axum::http::header::RETRY_AFTER, axum::http::HeaderValue::from_static("1"));
/// ```
pub struct Error {
    kind: ErrorKind,
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
    headers: HeaderMap,
}

impl Error {
    /// Creates a new error with the given kind and source.
    ///
    /// ```rust
    /// use axum_gatekeeper::{Error, ErrorKind};
    ///
    /// let err = Error::new(ErrorKind::Internal, "something went wrong");
    /// assert_eq!(err.kind(), ErrorKind::Internal);
    /// ```
    pub fn new<E>(kind: ErrorKind, error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self {
            kind,
            source: error.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error code string for this error.
    ///
    /// This is a stable identifier used in log lines.
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            ErrorKind::RequestTimeout => "REQUEST_TIMEOUT",
            ErrorKind::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ErrorKind::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
            ErrorKind::TooManyRequests => "TOO_MANY_REQUESTS",
            ErrorKind::RequestHeaderFieldsTooLarge => "REQUEST_HEADER_FIELDS_TOO_LARGE",
            ErrorKind::Configuration => "CONFIG_ERROR",
            ErrorKind::Io => "IO_ERROR",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorKind::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ErrorKind::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::RequestHeaderFieldsTooLarge => {
                StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE
            }
            ErrorKind::Configuration | ErrorKind::Io | ErrorKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the message shown to clients.
    ///
    /// Internal errors never leak their source.
    pub fn public_message(&self) -> String {
        if self.kind.is_internal() {
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            self.source.to_string()
        }
    }

    /// Adds a header to the response produced for this error.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Headers that will be attached to the error response.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Converts the error into the response envelope.
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse::new(self.status_code(), self.public_message())
    }

    /// Consumes the error and returns the inner error source.
    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self.source
    }
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl Error {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg.into())
    }

    pub fn method_not_allowed(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::MethodNotAllowed, msg.into())
    }

    pub fn request_timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestTimeout, msg.into())
    }

    pub fn payload_too_large(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::PayloadTooLarge, msg.into())
    }

    pub fn unsupported_media_type(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedMediaType, msg.into())
    }

    pub fn too_many_requests(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::TooManyRequests, msg.into())
    }

    pub fn header_fields_too_large(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestHeaderFieldsTooLarge, msg.into())
    }

    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, msg.into())
    }

    /// Creates an I/O error from a message.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, msg.into())
    }

    /// Creates an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, msg.into())
    }
}

// ============================================================================
// Trait implementations
// ============================================================================

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("source", &self.source)
            .field("headers", &self.headers)
            .finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = self.to_error_response();

        match self.kind {
            kind if kind.is_internal() => tracing::error!(
                error_code = %self.error_code(),
                error = %self.source,
                status = %status.as_u16(),
                "Internal error"
            ),
            ErrorKind::NotFound => tracing::error!(
                error_code = %self.error_code(),
                message = %error_response.message,
                status = %status.as_u16(),
                "Route not found"
            ),
            _ => tracing::debug!(
                error_code = %self.error_code(),
                message = %error_response.message,
                status = %status.as_u16(),
                "Request rejected"
            ),
        }

        let mut response = (status, Json(error_response)).into_response();
        response.headers_mut().extend(self.headers);
        response
    }
}

// ============================================================================
// From implementations
// ============================================================================

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::new(ErrorKind::Configuration, err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::new(ErrorKind::Configuration, err)
    }
}

impl From<std::env::VarError> for Error {
    fn from(err: std::env::VarError) -> Self {
        Self::new(ErrorKind::Configuration, err)
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::new(ErrorKind::Configuration, err)
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::new(ErrorKind::Configuration, err)
    }
}

#[cfg(feature = "metrics")]
impl From<prometheus::Error> for Error {
    fn from(err: prometheus::Error) -> Self {
        Self::new(ErrorKind::Internal, err)
    }
}

// ============================================================================
// ErrorResponse
// ============================================================================

/// The JSON envelope written for every rejected request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status code, repeated in the body.
    pub status: u16,
    /// Human-readable error message.
    pub message: String,
    /// RFC 3339 (ISO-8601) UTC timestamp of when the error was produced.
    pub timestamp: String,
}

impl ErrorResponse {
    /// Creates a new error response stamped with the current time.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
            timestamp: humantime::format_rfc3339_millis(SystemTime::now()).to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
