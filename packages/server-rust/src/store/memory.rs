//! In-memory [`VectorStore`] implementation backed by [`DashMap`].
//!
//! Brute-force cosine search over every stored embedding. Suitable for
//! development, tests, and small corpora.

use dashmap::DashMap;
use ordered_float::OrderedFloat;
use parking_lot::RwLock;
use ragway_core::{
    Document, EmbeddedDocument, MetadataFilter, ScoredDocument, StoredDocument,
};
use tracing::debug;
use uuid::Uuid;

use super::engine::VectorStore;
use super::StoreError;

#[derive(Debug, Clone)]
struct Entry {
    document: Document,
    embedding: Vec<f32>,
}

/// In-memory vector store with a single collection.
///
/// The embedding dimension is fixed by the first insert and released again
/// when the store becomes empty through a full delete.
pub struct InMemoryVectorStore {
    entries: DashMap<String, Entry>,
    // 0 = not yet fixed. Writers hold the write lock across the dimension
    // check and the map mutation, so the two never disagree.
    dimension: RwLock<usize>,
}

impl InMemoryVectorStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            dimension: RwLock::new(0),
        }
    }

    /// Number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixes the store's dimension on first use, then requires every later
/// embedding to match it.
fn fix_dimension(dimension: &mut usize, actual: usize) -> Result<(), StoreError> {
    if actual == 0 {
        return Err(StoreError::EmptyEmbedding);
    }
    match *dimension {
        0 => {
            *dimension = actual;
            Ok(())
        }
        expected if expected == actual => Ok(()),
        expected => Err(StoreError::DimensionMismatch { expected, actual }),
    }
}

/// Cosine distance in `[0, 2]`; 1.0 when either vector has zero norm.
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0_f32, 0.0_f32, 0.0_f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}

impl VectorStore for InMemoryVectorStore {
    fn get_all_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut ids: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn get_filtered_ids(&self, ids: &[String]) -> Result<Vec<String>, StoreError> {
        Ok(ids
            .iter()
            .filter(|id| self.entries.contains_key(id.as_str()))
            .cloned()
            .collect())
    }

    fn get_documents_by_ids(&self, ids: &[String]) -> Result<Vec<StoredDocument>, StoreError> {
        Ok(ids
            .iter()
            .filter_map(|id| {
                self.entries.get(id.as_str()).map(|entry| StoredDocument {
                    id: id.clone(),
                    document: entry.document.clone(),
                })
            })
            .collect())
    }

    fn delete(&self, ids: Option<&[String]>, collection_only: bool) -> Result<(), StoreError> {
        let mut dimension = self.dimension.write();
        match ids {
            Some(ids) => {
                let removed = ids
                    .iter()
                    .filter(|id| self.entries.remove(id.as_str()).is_some())
                    .count();
                debug!(requested = ids.len(), removed, collection_only, "deleted documents");
            }
            None => {
                let removed = self.entries.len();
                self.entries.clear();
                debug!(removed, collection_only, "deleted all documents");
            }
        }
        if self.entries.is_empty() {
            *dimension = 0;
        }
        Ok(())
    }

    fn similarity_search_with_score_by_vector(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<ScoredDocument>, StoreError> {
        if embedding.is_empty() {
            return Err(StoreError::EmptyEmbedding);
        }
        let dimension = self.dimension.read();
        let expected = *dimension;
        if expected != 0 && expected != embedding.len() {
            return Err(StoreError::DimensionMismatch {
                expected,
                actual: embedding.len(),
            });
        }

        let mut hits: Vec<ScoredDocument> = self
            .entries
            .iter()
            .filter(|entry| filter.map_or(true, |f| f.matches(&entry.document.metadata)))
            .map(|entry| ScoredDocument {
                document: entry.document.clone(),
                score: cosine_distance(embedding, &entry.embedding),
            })
            .collect();
        drop(dimension);

        hits.sort_by_key(|hit| OrderedFloat(hit.score));
        hits.truncate(k);
        Ok(hits)
    }

    fn add_documents(
        &self,
        documents: Vec<EmbeddedDocument>,
        ids: Option<Vec<String>>,
    ) -> Result<Vec<String>, StoreError> {
        let ids = match ids {
            Some(ids) if ids.len() != documents.len() => {
                return Err(StoreError::IdCountMismatch {
                    expected: documents.len(),
                    actual: ids.len(),
                });
            }
            Some(ids) => ids,
            None => documents
                .iter()
                .map(|_| Uuid::new_v4().to_string())
                .collect(),
        };

        let mut fixed = self.dimension.write();
        if let Some(first) = documents.first() {
            let dimension = first.embedding.len();
            if let Some(odd) = documents.iter().find(|d| d.embedding.len() != dimension) {
                return Err(StoreError::DimensionMismatch {
                    expected: dimension,
                    actual: odd.embedding.len(),
                });
            }
            fix_dimension(&mut fixed, dimension)?;
        }

        for (id, doc) in ids.iter().zip(documents) {
            self.entries.insert(
                id.clone(),
                Entry {
                    document: doc.document,
                    embedding: doc.embedding,
                },
            );
        }

        drop(fixed);

        debug!(count = ids.len(), "added documents");
        Ok(ids)
    }
}
