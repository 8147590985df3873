//! Blocking vector-store trait.
//!
//! Defines [`VectorStore`], the synchronous storage seam the async adapter
//! offloads to. Implementations may block on I/O (a database driver) or on
//! CPU (brute-force similarity), so they must never be called directly from
//! an async task.

use ragway_core::{EmbeddedDocument, MetadataFilter, ScoredDocument, StoredDocument};

use super::StoreError;

/// Synchronous document store with vector similarity search.
///
/// Wrapped in `Arc<dyn VectorStore>` for sharing across the worker pool.
pub trait VectorStore: Send + Sync + 'static {
    /// Every stored document id.
    fn get_all_ids(&self) -> Result<Vec<String>, StoreError>;

    /// The subset of `ids` that exist, in input order.
    fn get_filtered_ids(&self, ids: &[String]) -> Result<Vec<String>, StoreError>;

    /// Documents for the given ids, in input order. Unknown ids are skipped.
    fn get_documents_by_ids(&self, ids: &[String]) -> Result<Vec<StoredDocument>, StoreError>;

    /// Deletes the given ids, or everything when `ids` is `None`.
    ///
    /// `collection_only` restricts deletion to the store's own collection,
    /// leaving shared state (if any) in place.
    fn delete(&self, ids: Option<&[String]>, collection_only: bool) -> Result<(), StoreError>;

    /// The `k` documents closest to `embedding`, optionally restricted by `filter`.
    ///
    /// Results are ordered by ascending distance.
    fn similarity_search_with_score_by_vector(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<ScoredDocument>, StoreError>;

    /// Stores documents, returning their ids.
    ///
    /// When `ids` is given it must have one entry per document; otherwise ids
    /// are generated.
    fn add_documents(
        &self,
        documents: Vec<EmbeddedDocument>,
        ids: Option<Vec<String>>,
    ) -> Result<Vec<String>, StoreError>;
}
