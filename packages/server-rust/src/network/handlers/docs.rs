//! OpenAPI document and the interactive documentation page.

use axum::response::Html;
use axum::Json;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::documents::{AddDocumentsRequest, DeleteRequest, IdsRequest, QueryRequest};
use super::health::HealthResponse;
use super::ErrorBody;
use ragway_core::{Document, EmbeddedDocument, ScoredDocument, StoredDocument};

/// OpenAPI description of the gateway.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::network::handlers::health::health_handler,
        crate::network::handlers::documents::list_ids,
        crate::network::handlers::documents::filter_ids,
        crate::network::handlers::documents::add_documents,
        crate::network::handlers::documents::get_documents,
        crate::network::handlers::documents::delete_documents,
        crate::network::handlers::documents::query,
    ),
    components(schemas(
        Document,
        EmbeddedDocument,
        StoredDocument,
        ScoredDocument,
        IdsRequest,
        AddDocumentsRequest,
        DeleteRequest,
        QueryRequest,
        HealthResponse,
        ErrorBody,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "documents", description = "Vector-store document operations"),
        (name = "operations", description = "Health and documentation"),
    ),
    info(
        title = "ragway",
        description = "Authenticated, trace-correlated gateway for a RAG vector store"
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` security scheme referenced by the document routes.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

const DOCS_PAGE: &str = r##"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>ragway API</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.ui = SwaggerUIBundle({ url: "/openapi.json", dom_id: "#swagger-ui" });
  </script>
</body>
</html>
"##;

/// Swagger UI page rendering `/openapi.json`.
pub async fn docs_handler() -> Html<&'static str> {
    Html(DOCS_PAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in ["/health", "/ids", "/ids/filter", "/documents", "/documents/get", "/query"] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer"));
    }

    #[tokio::test]
    async fn docs_page_points_at_openapi_json() {
        let Html(page) = docs_handler().await;
        assert!(page.contains("url: \"/openapi.json\""));
        assert!(page.contains("dom_id: \"#swagger-ui\""));
        assert!(page.trim_end().ends_with("</html>"));
    }
}
