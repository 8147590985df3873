use crate::types::{Principal, TraceId};

/// Per-request context carrying the trace identifier and, once verified, the caller.
///
/// Snapshotted before work crosses an execution boundary (e.g. the blocking
/// worker pool) and restored on the other side, so logs emitted there stay
/// correlated with the originating request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    /// Distributed trace identifier for observability.
    pub trace_id: TraceId,
    /// Authenticated principal, if the request is authenticated.
    pub principal: Option<Principal>,
}

impl RequestContext {
    /// Creates an unauthenticated context for the given trace.
    #[must_use]
    pub fn new(trace_id: TraceId) -> Self {
        Self {
            trace_id,
            principal: None,
        }
    }

    /// Returns a copy of this context with the principal attached.
    #[must_use]
    pub fn with_principal(&self, principal: Principal) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            principal: Some(principal),
        }
    }

    /// Whether a verified principal is attached.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }
}
