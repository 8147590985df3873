//! Vector-store seam for the gateway.
//!
//! - [`VectorStore`]: the blocking storage contract
//! - [`InMemoryVectorStore`]: reference implementation with brute-force cosine search
//! - [`WorkerPool`] / [`run_with_context`]: bounded offload that keeps request context
//! - [`AsyncVectorStore`]: async front the HTTP handlers call

pub mod adapter;
pub mod config;
pub mod engine;
pub mod memory;
pub mod pool;

pub use adapter::AsyncVectorStore;
pub use config::StoreConfig;
pub use engine::VectorStore;
pub use memory::InMemoryVectorStore;
pub use pool::{run_with_context, WorkerPool};

/// Errors returned by store operations and the offload machinery.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("expected {expected} ids, got {actual}")]
    IdCountMismatch { expected: usize, actual: usize },
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("embedding must not be empty")]
    EmptyEmbedding,
    #[error("worker pool closed")]
    PoolClosed,
    #[error("store worker panicked: {0}")]
    WorkerPanicked(String),
}
