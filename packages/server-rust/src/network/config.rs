//! Network configuration types for the `ragway` server.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Paths that bypass bearer-token authentication by default.
pub const DEFAULT_EXEMPT_PATHS: [&str; 3] = ["/docs", "/openapi.json", "/health"];

/// Top-level network configuration for the server.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Bind address for the server.
    pub host: String,
    /// Port to listen on. 0 means OS-assigned.
    pub port: u16,
    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
    /// Allowed CORS origins.
    pub cors_origins: Vec<String>,
    /// Maximum time to wait for a request to complete.
    pub request_timeout: Duration,
    /// Bearer-token authentication settings.
    pub auth: AuthConfig,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 0,
            tls: None,
            cors_origins: vec!["*".to_string()],
            request_timeout: Duration::from_secs(30),
            auth: AuthConfig::default(),
        }
    }
}

/// TLS certificate configuration.
///
/// No `Default` impl because certificate paths have no sensible defaults.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file.
    pub cert_path: PathBuf,
    /// Path to the TLS private key file.
    pub key_path: PathBuf,
}

/// Bearer-token authentication settings.
///
/// When `jwt_secret` is absent or empty, authentication is disabled and every
/// request is forwarded (fail-open).
#[derive(Clone)]
pub struct AuthConfig {
    /// Shared HS256 signing secret.
    pub jwt_secret: Option<String>,
    /// Operational endpoints forwarded without any token check.
    pub exempt_paths: Vec<String>,
}

impl AuthConfig {
    /// Creates a config with the given secret and the default exempt paths.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: Some(secret.into()),
            ..Self::default()
        }
    }

    /// The configured secret, treating an empty string as unset.
    #[must_use]
    pub fn secret(&self) -> Option<&str> {
        self.jwt_secret.as_deref().filter(|s| !s.is_empty())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            exempt_paths: DEFAULT_EXEMPT_PATHS.iter().map(ToString::to_string).collect(),
        }
    }
}

// Hand-written so the secret never reaches logs.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.secret().map(|_| "<redacted>"))
            .field("exempt_paths", &self.exempt_paths)
            .finish()
    }
}
