//! Streaming request body limit.
//!
//! The body is never buffered here. [`LimitedBody`] counts bytes as the handler
//! pulls frames and drops the underlying stream as soon as the running total
//! crosses the ceiling, so an oversized upload is not read to its end.
//!
//! A handler that drops the body before its end hands the unread rest back to
//! the gate, which reads it to completion (or to the ceiling) before deciding
//! between the `413` and the accounting headers.

use {
    crate::{Error, HttpBodyLimitConfig, Result},
    axum::{
        body::{Body, Bytes},
        extract::{Request, State},
        middleware::Next,
        response::Response,
    },
    http::{HeaderMap, HeaderName, HeaderValue, header::CONTENT_LENGTH},
    http_body::{Frame, SizeHint},
    std::{
        pin::Pin,
        sync::{
            Arc,
            atomic::{AtomicBool, AtomicU64, Ordering},
        },
        task::{Context, Poll, ready},
    },
    tokio::sync::oneshot,
};

/// The byte ceiling that applied to the request.
pub const X_BODY_LIMIT_BYTES: HeaderName = HeaderName::from_static("x-body-limit-bytes");

/// Bytes left under the ceiling once the body was read, `0` when exceeded.
pub const X_BODY_REMAINING_BYTES: HeaderName = HeaderName::from_static("x-body-remaining-bytes");

#[derive(Debug, thiserror::Error)]
#[error("Request body exceeds limit of {limit} bytes.")]
pub(crate) struct BodyLimitExceeded {
    limit: u64,
}

/// Progress of one request body, shared between the gate and the body.
#[derive(Debug)]
pub(crate) struct BodyBudget {
    limit: u64,
    consumed: AtomicU64,
    exceeded: AtomicBool,
    completed: AtomicBool,
}

impl BodyBudget {
    fn new(limit: u64, completed: bool) -> Self {
        Self {
            limit,
            consumed: AtomicU64::new(0),
            exceeded: AtomicBool::new(false),
            completed: AtomicBool::new(completed),
        }
    }

    /// Adds `len` bytes and returns `true` if this call crossed the ceiling.
    fn consume(&self, len: u64) -> bool {
        let consumed = self.consumed.fetch_add(len, Ordering::AcqRel) + len;
        consumed > self.limit && !self.exceeded.swap(true, Ordering::AcqRel)
    }

    fn consumed(&self) -> u64 {
        self.consumed.load(Ordering::Acquire)
    }

    fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.consumed())
    }

    fn is_exceeded(&self) -> bool {
        self.exceeded.load(Ordering::Acquire)
    }

    fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }
}

/// A request body that fails once more than `limit` bytes were read.
pub(crate) struct LimitedBody {
    inner: Option<Body>,
    budget: Arc<BodyBudget>,
    unread: Option<oneshot::Sender<Body>>,
}

impl LimitedBody {
    pub(crate) fn new(inner: Body, budget: Arc<BodyBudget>) -> Self {
        Self {
            inner: Some(inner),
            budget,
            unread: None,
        }
    }

    /// Sends the unread rest of the body to `unread` if dropped before its end.
    pub(crate) fn returning_unread(mut self, unread: oneshot::Sender<Body>) -> Self {
        self.unread = Some(unread);
        self
    }

    /// Reads the remaining frames, stopping at the end or at the first error.
    async fn drain(mut self) {
        while let Some(frame) =
            std::future::poll_fn(|cx| http_body::Body::poll_frame(Pin::new(&mut self), cx)).await
        {
            if frame.is_err() {
                break;
            }
        }
    }
}

impl Drop for LimitedBody {
    fn drop(&mut self) {
        if let (Some(inner), Some(unread)) = (self.inner.take(), self.unread.take()) {
            let _ = unread.send(inner);
        }
    }
}

impl http_body::Body for LimitedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<std::result::Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };

        match ready!(Pin::new(inner).poll_frame(cx)) {
            Some(Ok(frame)) => {
                let len = frame.data_ref().map_or(0, |data| data.len() as u64);
                if this.budget.consumed() + len > this.budget.limit {
                    // Stop reading: the rest of the upload is never pulled.
                    this.inner = None;
                    if this.budget.consume(len) {
                        tracing::warn!(
                            limit = this.budget.limit,
                            consumed = this.budget.consumed(),
                            "Request body limit exceeded"
                        );
                    }
                    return Poll::Ready(Some(Err(axum::Error::new(BodyLimitExceeded {
                        limit: this.budget.limit,
                    }))));
                }
                this.budget.consume(len);
                Poll::Ready(Some(Ok(frame)))
            }
            Some(Err(err)) => Poll::Ready(Some(Err(err))),
            None => {
                this.budget.completed.store(true, Ordering::Release);
                this.inner = None;
                Poll::Ready(None)
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.as_ref().is_none_or(|inner| inner.is_end_stream())
    }

    fn size_hint(&self) -> SizeHint {
        self.inner
            .as_ref()
            .map_or_else(|| SizeHint::with_exact(0), |inner| inner.size_hint())
    }
}

pub(crate) async fn limit_body(
    State(config): State<Arc<HttpBodyLimitConfig>>,
    req: Request,
    next: Next,
) -> Result<Response> {
    let limit = config.limit_for(req.uri().path());

    if declared_length(req.headers()).is_some_and(|len| len > limit) {
        return Err(limit_exceeded(limit));
    }

    let (parts, body) = req.into_parts();
    let budget = Arc::new(BodyBudget::new(limit, http_body::Body::is_end_stream(&body)));
    let (unread_tx, mut unread_rx) = oneshot::channel();
    let body = LimitedBody::new(body, budget.clone()).returning_unread(unread_tx);
    let req = Request::from_parts(parts, Body::new(body));

    let mut response = next.run(req).await;

    // The handler let go of the body early; account for the rest of it.
    if !budget.is_completed() && !budget.is_exceeded() {
        if let Ok(rest) = unread_rx.try_recv() {
            LimitedBody::new(rest, budget.clone()).drain().await;
        }
    }

    if budget.is_exceeded() {
        return Err(limit_exceeded(limit));
    }

    if budget.is_completed() {
        let headers = response.headers_mut();
        headers.insert(X_BODY_LIMIT_BYTES, HeaderValue::from(limit));
        headers.insert(X_BODY_REMAINING_BYTES, HeaderValue::from(budget.remaining()));
    }

    Ok(response)
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn limit_exceeded(limit: u64) -> Error {
    Error::payload_too_large(BodyLimitExceeded { limit }.to_string())
        .with_header(X_BODY_LIMIT_BYTES, HeaderValue::from(limit))
        .with_header(X_BODY_REMAINING_BYTES, HeaderValue::from_static("0"))
}
