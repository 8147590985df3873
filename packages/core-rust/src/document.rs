//! Documents stored in and returned from the vector store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// A chunk of text plus arbitrary JSON metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct Document {
    /// Text content of the chunk.
    pub page_content: String,
    /// Free-form metadata (source file, page number, owner, ...).
    #[serde(default)]
    #[schema(value_type = Object)]
    pub metadata: Map<String, Value>,
}

impl Document {
    /// Creates a document with empty metadata.
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: Map::new(),
        }
    }

    /// Adds a metadata entry, builder style.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// A document paired with its precomputed embedding, as submitted for insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EmbeddedDocument {
    /// The document to store.
    #[serde(flatten)]
    pub document: Document,
    /// Embedding vector used for similarity search.
    pub embedding: Vec<f32>,
}

impl EmbeddedDocument {
    /// Pairs a document with its embedding.
    #[must_use]
    pub fn new(document: Document, embedding: Vec<f32>) -> Self {
        Self {
            document,
            embedding,
        }
    }
}

/// A document together with its stored identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoredDocument {
    /// Identifier assigned at insertion.
    pub id: String,
    /// The document itself.
    #[serde(flatten)]
    pub document: Document,
}

/// A similarity-search hit.
///
/// `score` is a cosine distance: lower means closer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScoredDocument {
    /// The matching document.
    pub document: Document,
    /// Cosine distance between the query and the stored embedding.
    pub score: f32,
}

/// Equality constraints over document metadata.
///
/// A document matches when every field named in the filter is present in its
/// metadata with an equal value. An empty filter matches everything.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataFilter(Map<String, Value>);

impl MetadataFilter {
    /// Wraps a JSON object of `field -> value` constraints.
    #[must_use]
    pub fn new(constraints: Map<String, Value>) -> Self {
        Self(constraints)
    }

    /// Whether `metadata` satisfies every constraint.
    #[must_use]
    pub fn matches(&self, metadata: &Map<String, Value>) -> bool {
        self.0
            .iter()
            .all(|(field, expected)| metadata.get(field) == Some(expected))
    }

    /// Whether the filter has no constraints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = MetadataFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&Map::new()));
        assert!(filter.matches(&metadata(json!({"file_id": "a"}))));
    }

    #[test]
    fn filter_requires_every_field_equal() {
        let filter = MetadataFilter::new(metadata(json!({"file_id": "a", "user_id": "u1"})));

        assert!(filter.matches(&metadata(json!({"file_id": "a", "user_id": "u1", "page": 3}))));
        assert!(!filter.matches(&metadata(json!({"file_id": "a"}))));
        assert!(!filter.matches(&metadata(json!({"file_id": "b", "user_id": "u1"}))));
    }

    #[test]
    fn document_deserializes_without_metadata() {
        let doc: Document = serde_json::from_value(json!({"page_content": "hello"})).unwrap();
        assert_eq!(doc, Document::new("hello"));
    }

    #[test]
    fn stored_document_flattens_fields() {
        let stored = StoredDocument {
            id: "doc-1".to_string(),
            document: Document::new("hello").with_metadata("page", json!(1)),
        };
        assert_eq!(
            serde_json::to_value(&stored).unwrap(),
            json!({"id": "doc-1", "page_content": "hello", "metadata": {"page": 1}})
        );
    }
}
