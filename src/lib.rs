//! # axum-gatekeeper
//!
//! A configurable request-gatekeeping pipeline for Axum services.
//!
//! Every inbound request passes through a fixed chain of independent gates before
//! it reaches a route handler. Each gate may admit the request, annotate the
//! response, or reject it with a typed [`Error`] that is rendered as one uniform
//! JSON envelope.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use axum_gatekeeper::{Config, Result, FluentRouter};
//!
//! async fn hello() -> &'static str {
//!     "Hello, World!"
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::default();  // Loads from config/{RUST_ENV}.toml
//!     config.setup_tracing();
//!     config.setup_fatal_handlers();
//!
//!     FluentRouter::without_state(config)?
//!         .route("/", get(hello))
//!         .setup_middleware()?
//!         .start()
//!         .await
//! }
//! ```
//!
//! # The Pipeline
//!
//! Requests traverse the gates in this order:
//!
//! | # | Gate | Rejects with |
//! |---|------|--------------|
//! | 1 | Request context (request id, method, path, client address) | - |
//! | 2 | Access logging and Prometheus metrics | - |
//! | 3 | Request timeout | 408 |
//! | 4 | Security headers | - |
//! | 5 | CORS | 403 |
//! | 6 | Sliding-window rate limiter | 429 |
//! | 7 | Method whitelist | 405 |
//! | 8 | Header count and size limits | 431, 415 |
//! | 9 | Header sanitizer | 400 |
//! | 10 | Content-Type gate | 415 |
//! | 11 | Streaming body limit | 413 |
//!
//! Unmatched routes produce a 404 with the same envelope:
//!
//! ```json
//! {
//!   "status": 404,
//!   "message": "Route not found — No route matches GET /nope.",
//!   "timestamp": "2024-05-01T12:00:00.000Z"
//! }
//! ```
//!
//! Liveness (`/live`) and readiness (`/ready`) health checks are answered after the
//! request context, logging and security headers, but ahead of the rate limiter
//! and the request gates.
//!
//! # Configuration
//!
//! ```rust
//! use axum_gatekeeper::Config;
//!
//! let config: Config = r#"
//!     [http]
//!     bind_port = 3000
//!     exclude = ["metrics"]
//!
//!     [http.rate_limit]
//!     window = "60s"
//!     max = 200
//!
//!     [http.body_limit]
//!     default_limit = "1MiB"
//!
//!     [[http.body_limit.route_overrides]]
//!     prefix = "/uploads"
//!     limit = "20MiB"
//! "#.parse().unwrap();
//! assert_eq!(config.http.rate_limit.max, 200);
//! ```
//!
//! # Request Context
//!
//! Code running inside a request can read the request id without it being passed
//! around explicitly:
//!
//! ```rust
//! use axum_gatekeeper::context;
//!
//! async fn handler() -> String {
//!     context::request_id().unwrap_or_default()
//! }
//! ```
//!
//! # Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Configuration loading and validation ([`Config`]) |
//! | [`context`] | Request-scoped context store |
//! | [`fluent`] | Router builder and gate setup ([`FluentRouter`]) |
//! | [`error`] | Error types and the response envelope ([`Error`]) |
//! | [`utils`] | Helpers shared by the gates |
mod config;
pub mod context;
mod error;
mod fluent;
mod utils;

pub use config::*;
pub use context::{ContextKey, RequestContext};
pub use error::*;
pub use fluent::*;
pub use utils::*;

pub type Result<T> = std::result::Result<T, Error>;
