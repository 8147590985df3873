//! HTTP middleware stack for the gateway.
//!
//! Layers are listed outermost first: the first one sees the request first
//! and the response last. Correlation is outermost so that every response,
//! including 401s, 408s and CORS preflights, carries the trace id, and every
//! log line below it runs inside the request's trace span.

use axum::http::{Method, StatusCode};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::auth::AuthLayer;
use super::config::NetworkConfig;
use super::correlation::CorrelationLayer;

/// The composed layer type produced by [`build_http_layers`].
///
/// `ServiceBuilder` nests each added layer around the previous ones, so the
/// innermost layer (auth) is the outermost `Stack` here.
pub type HttpLayers = tower::layer::util::Stack<
    AuthLayer,
    tower::layer::util::Stack<
        TimeoutLayer,
        tower::layer::util::Stack<
            CorsLayer,
            tower::layer::util::Stack<
                CompressionLayer,
                tower::layer::util::Stack<
                    TraceLayer<
                        tower_http::classify::SharedClassifier<
                            tower_http::classify::ServerErrorsAsFailures,
                        >,
                    >,
                    tower::layer::util::Stack<CorrelationLayer, tower::layer::util::Identity>,
                >,
            >,
        >,
    >,
>;

/// Builds the gateway's middleware stack.
///
/// **Ordering (outermost to innermost):**
/// 1. `Correlation` -- resolves the trace id, sets `X-Trace-ID`/`X-Request-ID`
///    on every response, including ones produced by the layers below
/// 2. `Trace` -- access spans, nested in the request's trace span
/// 3. `Compression` -- gzip responses
/// 4. `CORS` -- configured origins
/// 5. `Timeout` -- 408 after `request_timeout`
/// 6. `Auth` -- bearer-token check against the configured secret
#[must_use]
pub fn build_http_layers(config: &NetworkConfig) -> HttpLayers {
    ServiceBuilder::new()
        .layer(CorrelationLayer)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&config.cors_origins))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(AuthLayer::new(&config.auth))
        .into_inner()
}

/// A `"*"` entry allows any origin; otherwise unparsable origins are dropped.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Request};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    use super::*;
    use crate::network::config::AuthConfig;

    fn app(config: &NetworkConfig) -> Router {
        Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(build_http_layers(config))
    }

    #[tokio::test]
    async fn rejections_carry_trace_headers() {
        let config = NetworkConfig {
            auth: AuthConfig::with_secret("s3cret"),
            ..NetworkConfig::default()
        };

        let response = app(&config)
            .oneshot(
                Request::get("/ping")
                    .header("x-trace-id", "rejected-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()["x-trace-id"], "rejected-123");
        assert_eq!(response.headers()["x-request-id"], "rejected-123");
    }

    #[tokio::test]
    async fn cors_preflight_allows_delete() {
        let config = NetworkConfig {
            cors_origins: vec!["https://app.example.com".to_string()],
            ..NetworkConfig::default()
        };

        let response = app(&config)
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/ping")
                    .header(header::ORIGIN, "https://app.example.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.example.com"
        );
        let methods = response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
            .to_str()
            .unwrap();
        assert!(methods.contains("DELETE"));
        assert!(response.headers().contains_key("x-trace-id"));
    }

    #[tokio::test]
    async fn timeouts_return_408_with_trace_headers() {
        let config = NetworkConfig {
            request_timeout: Duration::from_millis(20),
            ..NetworkConfig::default()
        };
        let router = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            )
            .layer(build_http_layers(&config));

        let response = router
            .oneshot(
                Request::get("/slow")
                    .header("x-trace-id", "slow-408")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(response.headers()["x-trace-id"], "slow-408");
        assert_eq!(response.headers()["x-request-id"], "slow-408");
    }

    #[test]
    fn cors_layer_accepts_wildcard_and_lists() {
        let _any = build_cors_layer(&["*".to_string()]);
        let _list = build_cors_layer(&[
            "http://localhost:3000".to_string(),
            "not a url\n".to_string(),
        ]);
    }
}
