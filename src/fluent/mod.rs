//! FluentRouter and gate configuration.
//!
//! This module provides the router builder and one `setup_*` method per gate.
//! The functionality is split across submodules:
//!
//! - [`router`] - Core `FluentRouter` struct and initialization
//! - [`observability`] - Request context, access logging, metrics
//! - [`request`] - Header limits, header sanitizer, content type, body limit
//! - [`features`] - CORS, security headers, method whitelist, timeout, health checks, not-found
//! - [`control`] - Rate limiting and panic catching
//! - [`builder`] - Orchestration (setup_middleware, start, router delegation)

// Gate implementations
mod access_log;
mod body_limit;
mod content_type;
mod cors;
mod headers;
mod health;
#[cfg(feature = "metrics")]
mod metrics;
mod method_whitelist;
mod rate_limit;
mod security_headers;

mod builder;
mod control;
mod features;
mod observability;
mod request;
mod router;

pub use body_limit::{X_BODY_LIMIT_BYTES, X_BODY_REMAINING_BYTES};
pub use observability::X_REQUEST_ID;
pub use rate_limit::RateLimitKeyFn;
pub use router::FluentRouter;

#[cfg(test)]
mod tests;
