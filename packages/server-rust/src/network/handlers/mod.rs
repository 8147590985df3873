//! HTTP handlers for the gateway.
//!
//! Defines [`AppState`] (shared through axum's `State` extractor) and
//! [`ApiError`], the error type every fallible handler returns.

pub mod docs;
pub mod documents;
pub mod health;

pub use docs::{docs_handler, openapi_handler, ApiDoc};
pub use documents::{
    add_documents, delete_documents, filter_ids, get_documents, list_ids, query,
};
pub use health::health_handler;

use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use super::ShutdownController;
use crate::store::{AsyncVectorStore, StoreError};

/// Shared application state passed to all handlers.
///
/// Every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Async, context-preserving front for the vector store.
    pub store: AsyncVectorStore,
    /// Lifecycle state and in-flight tracking.
    pub shutdown: Arc<ShutdownController>,
    /// Process start time, used for uptime.
    pub start_time: Instant,
}

/// JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
}

/// Errors surfaced by the document API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid request body: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Store(err) => {
                error!(error = %err, "store call failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
