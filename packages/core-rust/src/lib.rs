//! `ragway` Core — trace identifiers, principals, request context, and documents.
//!
//! Runtime-free types shared by the gateway and the vector-store adapter.

pub mod context;
pub mod document;
pub mod types;

pub use context::RequestContext;
pub use document::{Document, EmbeddedDocument, MetadataFilter, ScoredDocument, StoredDocument};
pub use types::{Principal, TraceId, TRACE_ID_LEN};

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {
        // Empty body: if this test runs, the crate compiles and loads.
    }
}
