//! Bounded worker pool for blocking store calls.
//!
//! Jobs run on tokio's blocking thread pool; a semaphore caps how many run at
//! once, and submissions beyond the cap wait for a free permit.
//!
//! Blocking threads do not inherit the submitting task's task-local
//! [`RequestContext`](ragway_core::RequestContext) or its `tracing` span.
//! [`run_with_context`] snapshots both before dispatch and re-enters them on
//! the worker, so anything the job logs stays correlated with its request.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::Span;

use super::StoreError;
use crate::context;
use crate::network::ShutdownController;

/// Shared, bounded pool of blocking workers.
///
/// Cloning is cheap; clones share the same permits.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
    shutdown: Option<Arc<ShutdownController>>,
}

impl WorkerPool {
    /// Creates a pool running at most `size` jobs concurrently (minimum 1).
    #[must_use]
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
            shutdown: None,
        }
    }

    /// Makes every job hold an in-flight guard on `shutdown` while it runs,
    /// so graceful shutdown waits for offloaded work.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: Arc<ShutdownController>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Maximum number of concurrently running jobs.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of jobs that could start right now without waiting.
    #[must_use]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Stops accepting jobs. Pending and future submissions fail with
    /// [`StoreError::PoolClosed`]; running jobs finish normally.
    pub fn close(&self) {
        self.permits.close();
    }

    /// Runs `job` on a blocking worker and waits for its result.
    ///
    /// The job does not see the caller's request context; use
    /// [`run_with_context`] for that.
    pub async fn spawn<F, R>(&self, job: F) -> Result<R, StoreError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| StoreError::PoolClosed)?;
        let guard = self.shutdown.as_ref().map(|s| s.in_flight_guard());

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let _guard = guard;
            job()
        })
        .await
        .map_err(|err| StoreError::WorkerPanicked(err.to_string()))
    }
}

/// Runs `job` on `pool` inside the caller's request context and span.
///
/// Outside any request the job simply runs without a context.
pub async fn run_with_context<F, R>(pool: &WorkerPool, job: F) -> Result<R, StoreError>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let ctx = context::current();
    let span = Span::current();

    pool.spawn(move || {
        span.in_scope(|| match ctx {
            Some(ctx) => context::sync_scope(ctx, job),
            None => job(),
        })
    })
    .await
}
