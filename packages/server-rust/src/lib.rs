//! `ragway` Server — bearer-token and trace-correlation gateway in front of a
//! blocking vector store.

pub mod cli;
pub mod context;
pub mod network;
pub mod store;
pub mod telemetry;

pub use network::{NetworkConfig, NetworkModule};
pub use store::{AsyncVectorStore, InMemoryVectorStore, VectorStore, WorkerPool};
