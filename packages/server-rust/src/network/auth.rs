//! Bearer-token authentication middleware.
//!
//! Verifies `Authorization: Bearer <token>` against a shared HS256 secret,
//! rejects expired tokens, and attaches the decoded claims to the request as a
//! [`Principal`]. Exempt operational paths are always forwarded.
//!
//! When no secret is configured the layer fails open: it logs a warning and
//! forwards every request unauthenticated. Authentication is then fully
//! disabled.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use ragway_core::{Principal, RequestContext, TraceId};
use serde_json::{json, Map, Value};
use tower::{Layer, Service};
use tracing::{debug, info, warn};

use super::config::AuthConfig;
use crate::context;

const BEARER_PREFIX: &str = "Bearer ";

/// Why a request was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Missing or invalid Authorization header")]
    MissingCredentials,
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

impl AuthError {
    /// Short label used as a metrics dimension.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "missing_credentials",
            Self::Expired => "expired",
            Self::InvalidToken(_) => "invalid_token",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": self.to_string() })),
        )
            .into_response()
    }
}

/// Returns the token of an `Authorization: Bearer <token>` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let rest = value.strip_prefix(BEARER_PREFIX)?;
    rest.split(' ').next()
}

// ---------------------------------------------------------------------------
// TokenVerifier
// ---------------------------------------------------------------------------

/// Verifies HS256 tokens against a shared secret.
///
/// Signature checking is delegated to `jsonwebtoken`; `exp` is checked here so
/// an expired token yields [`AuthError::Expired`] rather than a library error.
/// Tokens without `exp` never expire.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Creates a verifier for the given shared secret.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = true;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verifies `token` against the current UTC time.
    pub fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0.0, |elapsed| elapsed.as_secs_f64());
        self.verify_at(token, now)
    }

    /// Verifies `token`, treating `now` (seconds since the epoch) as the current time.
    pub fn verify_at(&self, token: &str, now: f64) -> Result<Principal, AuthError> {
        let data = decode::<Map<String, Value>>(token, &self.key, &self.validation)
            .map_err(|err| AuthError::InvalidToken(err.to_string()))?;
        let principal = Principal::from_claims(data.claims);

        if let Some(exp) = principal.expiry() {
            let exp = exp.as_f64().ok_or_else(|| {
                AuthError::InvalidToken("Expiration Time claim (exp) must be a number".to_string())
            })?;
            if now > exp {
                return Err(AuthError::Expired);
            }
        }

        Ok(principal)
    }
}

/// Shared, immutable decision state for every request.
struct AuthPolicy {
    verifier: Option<TokenVerifier>,
    exempt_paths: Vec<String>,
}

impl AuthPolicy {
    fn is_exempt(&self, path: &str) -> bool {
        self.exempt_paths.iter().any(|exempt| {
            path == exempt
                || path
                    .strip_prefix(exempt.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

// ---------------------------------------------------------------------------
// AuthLayer
// ---------------------------------------------------------------------------

/// Tower layer enforcing bearer-token authentication.
#[derive(Clone)]
pub struct AuthLayer {
    policy: Arc<AuthPolicy>,
}

impl AuthLayer {
    /// Builds the layer from configuration. The secret is read once here.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            policy: Arc::new(AuthPolicy {
                verifier: config.secret().map(TokenVerifier::new),
                exempt_paths: config.exempt_paths.clone(),
            }),
        }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            policy: Arc::clone(&self.policy),
        }
    }
}

// ---------------------------------------------------------------------------
// AuthService
// ---------------------------------------------------------------------------

/// Service wrapper that forwards authenticated requests and short-circuits the rest.
#[derive(Clone)]
pub struct AuthService<S> {
    inner: S,
    policy: Arc<AuthPolicy>,
}

impl<S, B> Service<Request<B>> for AuthService<S>
where
    S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let policy = Arc::clone(&self.policy);
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let path = req.uri().path().to_owned();

            if policy.is_exempt(&path) {
                return inner.call(req).await;
            }

            let Some(verifier) = policy.verifier.as_ref() else {
                warn!(%path, "JWT secret not configured, authentication disabled; forwarding request");
                metrics::counter!("ragway_auth_bypass_total").increment(1);
                return inner.call(req).await;
            };

            let verified = bearer_token(req.headers())
                .ok_or(AuthError::MissingCredentials)
                .and_then(|token| verifier.verify(token));

            match verified {
                Ok(principal) => {
                    debug!(%path, claims = ?principal.claims(), "request authenticated");
                    let ctx = match context::current() {
                        Some(ctx) => ctx.with_principal(principal.clone()),
                        None => {
                            let trace_id = req
                                .extensions()
                                .get::<TraceId>()
                                .cloned()
                                .unwrap_or_else(TraceId::generate);
                            RequestContext::new(trace_id).with_principal(principal.clone())
                        }
                    };
                    req.extensions_mut().insert(principal);
                    context::scope(ctx, inner.call(req)).await
                }
                Err(err) => {
                    info!(%path, reason = %err, "unauthorized request");
                    metrics::counter!("ragway_auth_rejections_total", "reason" => err.reason())
                        .increment(1);
                    Ok(err.into_response())
                }
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use axum::body::Body;
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use tower::ServiceExt;

    use super::*;

    const SECRET: &str = "test-secret";

    fn token(claims: &Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn now() -> f64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs_f64()
    }

    fn auth_header(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_requires_prefix() {
        assert_eq!(bearer_token(&auth_header("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&auth_header("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&auth_header("bearer abc")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn bearer_token_takes_first_segment() {
        assert_eq!(bearer_token(&auth_header("Bearer abc extra")), Some("abc"));
        assert_eq!(bearer_token(&auth_header("Bearer ")), Some(""));
    }

    #[test]
    fn verify_accepts_valid_token() {
        let verifier = TokenVerifier::new(SECRET);
        let claims = json!({"sub": "user-1", "exp": now() as i64 + 60});
        let principal = verifier.verify(&token(&claims, SECRET)).unwrap();
        assert_eq!(principal.subject(), Some("user-1"));
    }

    #[test]
    fn verify_accepts_token_without_exp() {
        let verifier = TokenVerifier::new(SECRET);
        let principal = verifier.verify(&token(&json!({"sub": "svc"}), SECRET)).unwrap();
        assert!(principal.expiry().is_none());
    }

    #[test]
    fn verify_rejects_expired_token() {
        let verifier = TokenVerifier::new(SECRET);
        let claims = json!({"sub": "user-1", "exp": now() as i64 - 1});
        assert_eq!(verifier.verify(&token(&claims, SECRET)), Err(AuthError::Expired));
    }

    #[test]
    fn expiry_boundary_is_strict() {
        let verifier = TokenVerifier::new(SECRET);
        let jwt = token(&json!({"exp": 1_000}), SECRET);
        assert!(verifier.verify_at(&jwt, 1_000.0).is_ok());
        assert_eq!(verifier.verify_at(&jwt, 1_000.5), Err(AuthError::Expired));
    }

    #[test]
    fn verify_rejects_non_numeric_exp() {
        let verifier = TokenVerifier::new(SECRET);
        let err = verifier.verify(&token(&json!({"exp": "tomorrow"}), SECRET)).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let verifier = TokenVerifier::new(SECRET);
        let err = verifier.verify(&token(&json!({"sub": "x"}), "other")).unwrap_err();
        assert!(err.to_string().starts_with("Invalid token: "), "{err}");
    }

    #[test]
    fn verify_rejects_garbage() {
        let verifier = TokenVerifier::new(SECRET);
        assert!(matches!(verifier.verify("not-a-jwt"), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn verify_rejects_other_algorithms() {
        let verifier = TokenVerifier::new(SECRET);
        let jwt = encode(
            &Header::new(Algorithm::HS512),
            &json!({"sub": "x"}),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(matches!(verifier.verify(&jwt), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn exempt_paths_match_exactly_or_as_prefix_segment() {
        let layer = AuthLayer::new(&AuthConfig::with_secret(SECRET));
        let policy = &layer.policy;
        assert!(policy.is_exempt("/health"));
        assert!(policy.is_exempt("/docs"));
        assert!(policy.is_exempt("/docs/index.css"));
        assert!(policy.is_exempt("/openapi.json"));
        assert!(!policy.is_exempt("/healthz"));
        assert!(!policy.is_exempt("/documents"));
        assert!(!policy.is_exempt("/"));
    }

    /// Responds 200 with the subject seen in extensions and in the task-local context.
    async fn whoami(req: Request<Body>) -> Result<Response, Infallible> {
        let from_extensions = req.extensions().get::<Principal>().cloned();
        let from_context = context::current().and_then(|ctx| ctx.principal);
        assert_eq!(from_extensions, from_context);
        let subject = from_extensions
            .and_then(|p| p.subject().map(str::to_string))
            .unwrap_or_else(|| "anonymous".to_string());
        Ok(Response::new(Body::from(subject)))
    }

    async fn call(config: &AuthConfig, path: &str, authorization: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(path);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        AuthLayer::new(config)
            .layer(tower::service_fn(whoami))
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let response = call(&AuthConfig::with_secret(SECRET), "/ids", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await,
            json!({"detail": "Missing or invalid Authorization header"})
        );
    }

    #[tokio::test]
    async fn non_bearer_header_is_rejected() {
        let response = call(&AuthConfig::with_secret(SECRET), "/ids", Some("Token abc")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expired_token_is_rejected_with_fixed_reason() {
        let jwt = token(&json!({"sub": "u", "exp": now() as i64 - 1}), SECRET);
        let response = call(
            &AuthConfig::with_secret(SECRET),
            "/ids",
            Some(&format!("Bearer {jwt}")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({"detail": "Token has expired"}));
    }

    #[tokio::test]
    async fn valid_token_reaches_inner_with_principal() {
        let jwt = token(&json!({"sub": "user-7", "exp": now() as i64 + 300}), SECRET);
        let response = call(
            &AuthConfig::with_secret(SECRET),
            "/ids",
            Some(&format!("Bearer {jwt}")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "user-7");
    }

    #[tokio::test]
    async fn exempt_path_skips_check_even_with_bad_header() {
        let response = call(&AuthConfig::with_secret(SECRET), "/health", Some("Bearer junk")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "anonymous");
    }

    #[tokio::test]
    async fn missing_secret_fails_open() {
        let response = call(&AuthConfig::default(), "/ids", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "anonymous");
    }
}
