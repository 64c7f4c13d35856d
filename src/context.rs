//! Request-scoped context store.
//!
//! Each request gets a [`RequestContext`] bound to the logical task that serves
//! it, not to an OS thread, so it follows the request across `.await` points
//! and worker threads and is never visible to concurrently running requests.
//!
//! Outside a [`run`] scope every accessor is a no-op: reads return `None` and
//! writes are dropped.
//!
//! ```rust
//! use axum_gatekeeper::{context, ContextKey, RequestContext};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let ctx = RequestContext::new("GET", "/items", "127.0.0.1");
//! let id = ctx.request_id.clone();
//!
//! let seen = context::run(ctx, async {
//!     tokio::task::yield_now().await;
//!     context::get(ContextKey::RequestId)
//! })
//! .await;
//!
//! assert_eq!(seen, Some(id));
//! assert_eq!(context::get(ContextKey::RequestId), None);
//! # }
//! ```
//!
//! Task-locals do not cross `tokio::spawn`; wrap spawned work with
//! [`scope_current`] to hand it a copy of the caller's context.

use {
    crate::utils::generate_request_id,
    std::{cell::RefCell, future::Future},
};

tokio::task_local! {
    static CURRENT: RefCell<RequestContext>;
}

/// Per-request values available to all code running on behalf of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: String,
    pub method: String,
    pub path: String,
    pub client_address: String,
}

/// Addresses one field of a [`RequestContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKey {
    RequestId,
    Method,
    Path,
    ClientAddress,
}

impl RequestContext {
    /// Creates a context with a freshly generated request id.
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        client_address: impl Into<String>,
    ) -> Self {
        Self {
            request_id: generate_request_id(),
            method: method.into(),
            path: path.into(),
            client_address: client_address.into(),
        }
    }

    pub fn get(&self, key: ContextKey) -> &str {
        match key {
            ContextKey::RequestId => &self.request_id,
            ContextKey::Method => &self.method,
            ContextKey::Path => &self.path,
            ContextKey::ClientAddress => &self.client_address,
        }
    }

    pub fn set(&mut self, key: ContextKey, value: String) {
        match key {
            ContextKey::RequestId => self.request_id = value,
            ContextKey::Method => self.method = value,
            ContextKey::Path => self.path = value,
            ContextKey::ClientAddress => self.client_address = value,
        }
    }
}

/// Runs `work` with `ctx` as the current request context.
pub async fn run<F: Future>(ctx: RequestContext, work: F) -> F::Output {
    CURRENT.scope(RefCell::new(ctx), work).await
}

/// Synchronous counterpart of [`run`].
pub fn sync_run<R>(ctx: RequestContext, work: impl FnOnce() -> R) -> R {
    CURRENT.sync_scope(RefCell::new(ctx), work)
}

/// Reads one field of the current request context.
pub fn get(key: ContextKey) -> Option<String> {
    CURRENT
        .try_with(|ctx| ctx.borrow().get(key).to_string())
        .ok()
}

/// Overwrites one field of the current request context.
pub fn set(key: ContextKey, value: impl Into<String>) {
    let value = value.into();
    let _ = CURRENT.try_with(|ctx| ctx.borrow_mut().set(key, value));
}

/// Returns a copy of the whole current request context.
pub fn current() -> Option<RequestContext> {
    CURRENT.try_with(|ctx| ctx.borrow().clone()).ok()
}

/// Whether the caller runs inside a [`run`] scope.
pub fn is_active() -> bool {
    CURRENT.try_with(|_| ()).is_ok()
}

/// Shorthand for `get(ContextKey::RequestId)`.
pub fn request_id() -> Option<String> {
    get(ContextKey::RequestId)
}

/// Captures the caller's context now and re-establishes it around `work`.
///
/// The copy is independent: writes made by `work` are not seen by the caller.
pub fn scope_current<F: Future>(work: F) -> impl Future<Output = F::Output> {
    let ctx = current();
    async move {
        match ctx {
            Some(ctx) => run(ctx, work).await,
            None => work.await,
        }
    }
}
