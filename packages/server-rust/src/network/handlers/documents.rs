//! Document API: the async vector-store operations exposed over HTTP.
//!
//! Every route here sits behind the security stage. Store calls run on the
//! worker pool through [`AsyncVectorStore`](crate::store::AsyncVectorStore),
//! so their logs keep the request's trace id.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use ragway_core::{EmbeddedDocument, MetadataFilter, ScoredDocument, StoredDocument};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use super::{ApiError, AppState, ErrorBody};

const DEFAULT_K: usize = 4;

fn default_k() -> usize {
    DEFAULT_K
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct IdsRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddDocumentsRequest {
    pub documents: Vec<EmbeddedDocument>,
    /// One id per document; generated when omitted.
    #[serde(default)]
    pub ids: Option<Vec<String>>,
}

/// Omitting `ids` deletes every document.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DeleteRequest {
    #[serde(default)]
    pub ids: Option<Vec<String>>,
    #[serde(default)]
    pub collection_only: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct QueryRequest {
    pub embedding: Vec<f32>,
    #[serde(default = "default_k")]
    pub k: usize,
    /// Field-equality constraints on document metadata.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub filter: Option<MetadataFilter>,
}

#[utoipa::path(
    get,
    path = "/ids",
    responses(
        (status = 200, description = "Every stored id", body = Vec<String>),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn list_ids(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.store.get_all_ids(None).await?))
}

#[utoipa::path(
    post,
    path = "/ids/filter",
    request_body = IdsRequest,
    responses(
        (status = 200, description = "The given ids that exist, in request order", body = Vec<String>),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn filter_ids(
    State(state): State<AppState>,
    Json(request): Json<IdsRequest>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.store.get_filtered_ids(request.ids, None).await?))
}

#[utoipa::path(
    post,
    path = "/documents",
    request_body = AddDocumentsRequest,
    responses(
        (status = 200, description = "Ids of the stored documents", body = Vec<String>),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 500, description = "Store rejected the documents", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn add_documents(
    State(state): State<AppState>,
    Json(request): Json<AddDocumentsRequest>,
) -> Result<Json<Vec<String>>, ApiError> {
    let ids = state
        .store
        .add_documents(request.documents, request.ids, None)
        .await?;
    info!(count = ids.len(), "documents added");
    Ok(Json(ids))
}

#[utoipa::path(
    post,
    path = "/documents/get",
    request_body = IdsRequest,
    responses(
        (status = 200, description = "Documents for the known ids", body = Vec<StoredDocument>),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn get_documents(
    State(state): State<AppState>,
    Json(request): Json<IdsRequest>,
) -> Result<Json<Vec<StoredDocument>>, ApiError> {
    Ok(Json(state.store.get_documents_by_ids(request.ids, None).await?))
}

/// The body is optional: an empty body deletes everything.
#[utoipa::path(
    delete,
    path = "/documents",
    request_body = DeleteRequest,
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Malformed body", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn delete_documents(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        DeleteRequest::default()
    } else {
        serde_json::from_slice::<DeleteRequest>(&body)
            .map_err(|err| ApiError::BadRequest(err.to_string()))?
    };

    let scope = request.ids.as_ref().map_or("all", |_| "ids");
    state
        .store
        .delete(request.ids, request.collection_only, None)
        .await?;
    info!(scope, collection_only = request.collection_only, "documents deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Closest documents, ascending cosine distance", body = Vec<ScoredDocument>),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 500, description = "Store rejected the query", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<Vec<ScoredDocument>>, ApiError> {
    let hits = state
        .store
        .similarity_search_with_score_by_vector(request.embedding, request.k, request.filter, None)
        .await?;
    Ok(Json(hits))
}
