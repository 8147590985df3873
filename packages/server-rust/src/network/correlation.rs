//! Trace correlation middleware.
//!
//! Resolves one trace identifier per request, publishes it to the task-local
//! [`RequestContext`](ragway_core::RequestContext) and the request extensions,
//! runs the rest of the stack inside a `request` span carrying it, and echoes
//! it back in the `X-Trace-ID` and `X-Request-ID` response headers.
//!
//! Resolution order:
//! 1. `traceparent` (W3C `version-traceid-spanid-flags`), second field.
//!    A present but unparseable header falls back to generation.
//! 2. `X-Trace-ID`, `X-Request-ID`, `X-Correlation-ID`: first non-empty value.
//! 3. A freshly generated 32-char lowercase hex identifier.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::http::header::HeaderName;
use axum::http::{HeaderMap, HeaderValue, Request, Response};
use ragway_core::{RequestContext, TraceId};
use tower::{Layer, Service};
use tracing::{info_span, warn, Instrument};

use crate::context;

/// W3C trace-context propagation header.
pub const TRACEPARENT: HeaderName = HeaderName::from_static("traceparent");
/// Trace identifier header, read on ingress and written on egress.
pub const X_TRACE_ID: HeaderName = HeaderName::from_static("x-trace-id");
/// Request identifier header, read on ingress and written on egress.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
/// Correlation identifier header, read on ingress only.
pub const X_CORRELATION_ID: HeaderName = HeaderName::from_static("x-correlation-id");

const FALLBACK_HEADERS: [HeaderName; 3] = [X_TRACE_ID, X_REQUEST_ID, X_CORRELATION_ID];

/// Picks the trace identifier for a request from its headers.
#[must_use]
pub fn resolve_trace_id(headers: &HeaderMap) -> TraceId {
    let propagated = match headers.get(&TRACEPARENT) {
        Some(value) => value.to_str().ok().and_then(parse_traceparent),
        None => FALLBACK_HEADERS
            .iter()
            .find_map(|name| non_empty_header(headers, name)),
    };

    propagated.map_or_else(TraceId::generate, TraceId::new)
}

/// Extracts the trace-id field from a `traceparent` value.
fn parse_traceparent(value: &str) -> Option<&str> {
    let mut fields = value.split('-');
    let _version = fields.next()?;
    let trace_id = fields.next()?;
    let _span_id = fields.next()?;
    let _flags = fields.next()?;

    (!trace_id.is_empty()).then_some(trace_id)
}

fn non_empty_header<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

// ---------------------------------------------------------------------------
// CorrelationLayer
// ---------------------------------------------------------------------------

/// Tower layer that assigns a trace identifier to every request.
///
/// Never rejects a request.
#[derive(Debug, Clone, Default)]
pub struct CorrelationLayer;

impl<S> Layer<S> for CorrelationLayer {
    type Service = CorrelationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationService { inner }
    }
}

// ---------------------------------------------------------------------------
// CorrelationService
// ---------------------------------------------------------------------------

/// Service wrapper that runs the inner service inside the request's trace scope.
#[derive(Debug, Clone)]
pub struct CorrelationService<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CorrelationService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let trace_id = resolve_trace_id(req.headers());
        req.extensions_mut().insert(trace_id.clone());

        let span = info_span!(
            "request",
            trace_id = %trace_id,
            method = %req.method(),
            path = %req.uri().path(),
        );
        let ctx = RequestContext::new(trace_id.clone());

        // The ready service is taken and a fresh clone left in its place, so the
        // inner call itself happens inside the trace scope.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(context::scope(
            ctx,
            async move {
                let mut response = inner.call(req).await?;
                stamp_trace_headers(response.headers_mut(), &trace_id);
                Ok(response)
            }
            .instrument(span),
        ))
    }
}

fn stamp_trace_headers(headers: &mut HeaderMap, trace_id: &TraceId) {
    match HeaderValue::from_str(trace_id.as_str()) {
        Ok(value) => {
            headers.insert(X_TRACE_ID, value.clone());
            headers.insert(X_REQUEST_ID, value);
        }
        Err(_) => warn!(%trace_id, "trace id is not a valid header value, skipping response headers"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
