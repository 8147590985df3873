//! Task-local request context.
//!
//! The correlation stage opens a scope holding the request's
//! [`RequestContext`]; the security stage re-opens it with the verified
//! principal attached. Any code running inside the request's task can read it
//! through [`current`]. Work that leaves the task (the blocking worker pool)
//! must snapshot it first and re-enter it with [`sync_scope`].

use std::future::Future;

use ragway_core::{RequestContext, TraceId};

tokio::task_local! {
    static REQUEST_CONTEXT: RequestContext;
}

/// Runs `fut` with `ctx` as the task-local request context.
pub async fn scope<F: Future>(ctx: RequestContext, fut: F) -> F::Output {
    REQUEST_CONTEXT.scope(ctx, fut).await
}

/// Runs the synchronous closure `f` with `ctx` as the request context.
///
/// Used on blocking worker threads, where no task-local scope is inherited.
pub fn sync_scope<R>(ctx: RequestContext, f: impl FnOnce() -> R) -> R {
    REQUEST_CONTEXT.sync_scope(ctx, f)
}

/// Snapshot of the current request context, or `None` outside any request.
#[must_use]
pub fn current() -> Option<RequestContext> {
    REQUEST_CONTEXT.try_with(Clone::clone).ok()
}

/// The current request's trace identifier, or `None` outside any request.
#[must_use]
pub fn current_trace_id() -> Option<TraceId> {
    REQUEST_CONTEXT.try_with(|ctx| ctx.trace_id.clone()).ok()
}
