//! Async adapter over a blocking [`VectorStore`].
//!
//! Every method forwards to its synchronous counterpart on a [`WorkerPool`]
//! via [`run_with_context`], suspending the calling task until the worker
//! finishes. Each call accepts an optional pool that overrides the adapter's
//! default one.

use std::sync::Arc;

use ragway_core::{EmbeddedDocument, MetadataFilter, ScoredDocument, StoredDocument};
use tracing::debug;

use super::engine::VectorStore;
use super::pool::{run_with_context, WorkerPool};
use super::StoreError;
use crate::context;

/// Async, context-preserving front for a blocking vector store.
///
/// Cloning is cheap and shares both the store and the default pool.
#[derive(Clone)]
pub struct AsyncVectorStore {
    inner: Arc<dyn VectorStore>,
    pool: WorkerPool,
}

impl AsyncVectorStore {
    /// Wraps `inner`, offloading to `pool` unless a call names another pool.
    #[must_use]
    pub fn new(inner: Arc<dyn VectorStore>, pool: WorkerPool) -> Self {
        Self { inner, pool }
    }

    /// The default worker pool.
    #[must_use]
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Every stored id.
    pub async fn get_all_ids(&self, pool: Option<&WorkerPool>) -> Result<Vec<String>, StoreError> {
        self.offload("get_all_ids", pool, |store| store.get_all_ids())
            .await
    }

    /// The subset of `ids` present in the store, in input order.
    pub async fn get_filtered_ids(
        &self,
        ids: Vec<String>,
        pool: Option<&WorkerPool>,
    ) -> Result<Vec<String>, StoreError> {
        self.offload("get_filtered_ids", pool, move |store| store.get_filtered_ids(&ids))
            .await
    }

    /// Stored documents for the known ids in `ids`; unknown ids are skipped.
    pub async fn get_documents_by_ids(
        &self,
        ids: Vec<String>,
        pool: Option<&WorkerPool>,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        self.offload("get_documents_by_ids", pool, move |store| {
            store.get_documents_by_ids(&ids)
        })
        .await
    }

    /// Removes `ids`, or everything when `ids` is `None`.
    pub async fn delete(
        &self,
        ids: Option<Vec<String>>,
        collection_only: bool,
        pool: Option<&WorkerPool>,
    ) -> Result<(), StoreError> {
        self.offload("delete", pool, move |store| {
            store.delete(ids.as_deref(), collection_only)
        })
        .await
    }

    /// Up to `k` nearest documents to `embedding` with their cosine distances.
    pub async fn similarity_search_with_score_by_vector(
        &self,
        embedding: Vec<f32>,
        k: usize,
        filter: Option<MetadataFilter>,
        pool: Option<&WorkerPool>,
    ) -> Result<Vec<ScoredDocument>, StoreError> {
        self.offload("similarity_search", pool, move |store| {
            store.similarity_search_with_score_by_vector(&embedding, k, filter.as_ref())
        })
        .await
    }

    /// Stores `documents`, returning their ids (generated when `ids` is `None`).
    pub async fn add_documents(
        &self,
        documents: Vec<EmbeddedDocument>,
        ids: Option<Vec<String>>,
        pool: Option<&WorkerPool>,
    ) -> Result<Vec<String>, StoreError> {
        self.offload("add_documents", pool, move |store| {
            store.add_documents(documents, ids)
        })
        .await
    }

    async fn offload<F, R>(
        &self,
        op: &'static str,
        pool: Option<&WorkerPool>,
        call: F,
    ) -> Result<R, StoreError>
    where
        F: FnOnce(&dyn VectorStore) -> Result<R, StoreError> + Send + 'static,
        R: Send + 'static,
    {
        metrics::counter!("ragway_store_calls_total", "op" => op).increment(1);
        let store = Arc::clone(&self.inner);
        let pool = pool.unwrap_or(&self.pool);

        run_with_context(pool, move || {
            debug!(op, trace_id = ?context::current_trace_id(), "running store call on worker");
            call(store.as_ref())
        })
        .await?
    }
}
