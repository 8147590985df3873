//! HTTP surface of the gateway: configuration, the correlation and security
//! stages, handlers, and the server lifecycle.

pub mod auth;
pub mod config;
pub mod correlation;
pub mod handlers;
pub mod middleware;
pub mod module;
pub mod shutdown;

pub use auth::{AuthError, AuthLayer, TokenVerifier};
pub use config::*;
pub use correlation::{resolve_trace_id, CorrelationLayer};
pub use handlers::AppState;
pub use middleware::build_http_layers;
pub use module::NetworkModule;
pub use shutdown::*;

// ---------------------------------------------------------------------------
// Integration tests
// ---------------------------------------------------------------------------
