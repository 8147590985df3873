//! Command-line and environment configuration.
//!
//! Every flag falls back to an environment variable, so the gateway can be
//! configured entirely through its container environment.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::network::{AuthConfig, NetworkConfig, TlsConfig, DEFAULT_EXEMPT_PATHS};
use crate::store::StoreConfig;
use crate::telemetry::LogFormat;

#[derive(Parser, Debug)]
#[command(name = "ragway")]
#[command(about = "Authenticated, trace-correlated gateway for a RAG vector store")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[arg(long, env = "RAGWAY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "RAGWAY_PORT", default_value_t = 8000)]
    pub port: u16,

    /// HS256 secret for bearer tokens. Unset or empty disables authentication.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Comma-separated allowed origins; `*` allows any.
    #[arg(long, env = "RAGWAY_CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    pub cors_origins: Vec<String>,

    #[arg(long, env = "RAGWAY_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Maximum concurrent blocking store calls.
    #[arg(long, env = "RAGWAY_BLOCKING_WORKERS", default_value_t = 32)]
    pub blocking_workers: usize,

    #[arg(long, env = "RAGWAY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Serve Prometheus metrics on this port.
    #[arg(long, env = "RAGWAY_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    #[arg(long, env = "RAGWAY_TLS_CERT", requires = "tls_key")]
    pub tls_cert: Option<PathBuf>,

    #[arg(long, env = "RAGWAY_TLS_KEY", requires = "tls_cert")]
    pub tls_key: Option<PathBuf>,
}

impl Cli {
    #[must_use]
    pub fn network_config(&self) -> NetworkConfig {
        let tls = match (&self.tls_cert, &self.tls_key) {
            (Some(cert_path), Some(key_path)) => Some(TlsConfig {
                cert_path: cert_path.clone(),
                key_path: key_path.clone(),
            }),
            _ => None,
        };

        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            tls,
            cors_origins: self.cors_origins.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            auth: AuthConfig {
                jwt_secret: self.jwt_secret.clone(),
                exempt_paths: DEFAULT_EXEMPT_PATHS.iter().map(|p| (*p).to_string()).collect(),
            },
        }
    }

    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            blocking_workers: self.blocking_workers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ragway").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_map_onto_network_config() {
        let cli = parse(&[
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
            "--jwt-secret",
            "s3cret",
            "--cors-origins",
            "https://a.example,https://b.example",
            "--request-timeout-secs",
            "5",
        ]);
        let config = cli.network_config();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.auth.secret(), Some("s3cret"));
        assert_eq!(config.cors_origins, ["https://a.example", "https://b.example"]);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.auth.exempt_paths, DEFAULT_EXEMPT_PATHS);
        assert!(config.tls.is_none());
    }

    #[test]
    fn empty_secret_counts_as_unset() {
        let cli = parse(&["--jwt-secret", ""]);
        assert_eq!(cli.network_config().auth.secret(), None);
    }

    #[test]
    fn tls_requires_both_paths() {
        let result = Cli::try_parse_from(["ragway", "--tls-cert", "cert.pem"]);
        assert!(result.is_err());

        let cli = parse(&["--tls-cert", "cert.pem", "--tls-key", "key.pem"]);
        let tls = cli.network_config().tls.unwrap();
        assert_eq!(tls.cert_path, PathBuf::from("cert.pem"));
        assert_eq!(tls.key_path, PathBuf::from("key.pem"));
    }

    #[test]
    fn workers_and_log_format() {
        let cli = parse(&["--blocking-workers", "4", "--log-format", "json", "--metrics-port", "9100"]);
        assert_eq!(cli.store_config().blocking_workers, 4);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.metrics_port, Some(9100));
    }
}
