//! `ragway` gateway binary.

use std::sync::Arc;

use clap::Parser;
use ragway_server::cli::Cli;
use ragway_server::network::NetworkModule;
use ragway_server::store::InMemoryVectorStore;
use ragway_server::telemetry;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.log_format)?;

    if let Some(port) = cli.metrics_port {
        telemetry::install_metrics_exporter(port)?;
        info!(port, "prometheus exporter listening");
    }

    let network_config = cli.network_config();
    if network_config.auth.secret().is_none() {
        warn!("JWT_SECRET is not set: authentication is DISABLED and every request will be forwarded");
    }

    let mut module = NetworkModule::new(
        network_config,
        Arc::new(InMemoryVectorStore::new()),
        &cli.store_config(),
    );
    let port = module.start().await?;
    info!(port, workers = cli.blocking_workers, "ragway starting");

    module.serve(shutdown_signal()).await?;
    info!("ragway stopped");
    Ok(())
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received, draining");
}
