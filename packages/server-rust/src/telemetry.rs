//! Logging and metrics initialisation.

use std::net::{Ipv4Addr, SocketAddr};

use anyhow::Context as _;
use clap::ValueEnum;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable, for terminals.
    #[default]
    Pretty,
    /// One JSON object per line, for log shippers.
    Json,
}

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global `tracing` subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true);

    let installed = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
    };
    installed.map_err(|err| anyhow::anyhow!(err))
}

/// Serves Prometheus metrics on `0.0.0.0:<port>/metrics`.
///
/// # Errors
///
/// Returns an error if the recorder is already installed or the listener
/// cannot be started.
pub fn install_metrics_exporter(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .with_context(|| format!("failed to start metrics exporter on {addr}"))?;

    metrics::describe_counter!(
        "ragway_auth_rejections_total",
        "Requests rejected by the bearer-token check, by reason"
    );
    metrics::describe_counter!(
        "ragway_auth_bypass_total",
        "Requests forwarded without a check because no secret is configured"
    );
    metrics::describe_counter!(
        "ragway_store_calls_total",
        "Store calls offloaded to the worker pool, by operation"
    );
    Ok(())
}
