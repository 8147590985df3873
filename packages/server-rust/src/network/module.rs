//! Gateway lifecycle with deferred startup.
//!
//! `new()` wires the store, worker pool and shutdown controller, `start()`
//! binds the listener, and `serve()` accepts requests until shutdown is
//! signalled, then drains offloaded store work.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::{NetworkConfig, TlsConfig};
use super::handlers::{
    add_documents, delete_documents, docs_handler, filter_ids, get_documents, health_handler,
    list_ids, openapi_handler, query, AppState,
};
use super::middleware::build_http_layers;
use super::shutdown::ShutdownController;
use crate::store::{AsyncVectorStore, StoreConfig, VectorStore, WorkerPool};

const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Owns the gateway's shared state and its listener.
///
/// 1. `new()` -- builds the worker pool and async store adapter
/// 2. `start()` -- binds the TCP listener
/// 3. `serve()` -- serves until the shutdown future resolves or
///    [`ShutdownController::trigger_shutdown`] is called
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    store: AsyncVectorStore,
    shutdown: Arc<ShutdownController>,
    start_time: Instant,
}

impl NetworkModule {
    /// Creates the module without binding any port.
    #[must_use]
    pub fn new(
        config: NetworkConfig,
        store: Arc<dyn VectorStore>,
        store_config: &StoreConfig,
    ) -> Self {
        let shutdown = Arc::new(ShutdownController::new());
        let pool = WorkerPool::new(store_config.blocking_workers)
            .with_shutdown(Arc::clone(&shutdown));

        Self {
            config,
            listener: None,
            store: AsyncVectorStore::new(store, pool),
            shutdown,
            start_time: Instant::now(),
        }
    }

    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    #[must_use]
    pub fn store(&self) -> &AsyncVectorStore {
        &self.store
    }

    /// Assembles every route behind the middleware stack.
    ///
    /// Routes:
    /// - `GET /health`, `GET /openapi.json`, `GET /docs` -- exempt from auth by default
    /// - `GET /ids`, `POST /ids/filter`
    /// - `POST /documents`, `DELETE /documents`, `POST /documents/get`
    /// - `POST /query`
    pub fn build_router(&self) -> Router {
        let state = AppState {
            store: self.store.clone(),
            shutdown: Arc::clone(&self.shutdown),
            start_time: self.start_time,
        };

        Router::new()
            .route("/health", get(health_handler))
            .route("/openapi.json", get(openapi_handler))
            .route("/docs", get(docs_handler))
            .route("/ids", get(list_ids))
            .route("/ids/filter", post(filter_ids))
            .route("/documents", post(add_documents).delete(delete_documents))
            .route("/documents/get", post(get_documents))
            .route("/query", post(query))
            .layer(build_http_layers(&self.config))
            .with_state(state)
    }

    /// Binds the listener and returns the bound port (useful with port 0).
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        let port = listener.local_addr()?.port();

        info!(host = %self.config.host, port, "listener bound");

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves until shutdown, then drains in-flight store work.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called, TLS material cannot be
    /// loaded, or the server hits a fatal I/O error.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let router = self.build_router();
        let listener = self
            .listener
            .context("start() must be called before serve()")?;
        let controller = self.shutdown;

        let trigger = Arc::clone(&controller);
        tokio::spawn(async move {
            shutdown.await;
            trigger.trigger_shutdown();
        });

        controller.set_ready();

        match &self.config.tls {
            Some(tls) => serve_tls(listener, router, tls, Arc::clone(&controller)).await?,
            None => serve_plain(listener, router, Arc::clone(&controller)).await?,
        }

        self.store.pool().close();
        drain(&controller).await;
        Ok(())
    }
}

async fn serve_plain(
    listener: TcpListener,
    router: Router,
    controller: Arc<ShutdownController>,
) -> anyhow::Result<()> {
    info!("serving plain HTTP");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { controller.wait_for_shutdown().await })
        .await?;
    Ok(())
}

/// Serves TLS via `axum-server`, reusing the already bound listener.
async fn serve_tls(
    listener: TcpListener,
    router: Router,
    tls: &TlsConfig,
    controller: Arc<ShutdownController>,
) -> anyhow::Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .context("failed to load TLS certificates")?;

    let addr = listener.local_addr()?;
    let std_listener = listener.into_std()?;
    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();

    tokio::spawn(async move {
        controller.wait_for_shutdown().await;
        shutdown_handle.graceful_shutdown(None);
    });

    info!(%addr, "serving TLS");

    axum_server::from_tcp_rustls(std_listener, rustls_config)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;
    Ok(())
}

async fn drain(controller: &ShutdownController) {
    controller.trigger_shutdown();

    let pending = controller.in_flight_count();
    if pending > 0 {
        info!(pending, "waiting for offloaded store work");
    }

    if controller.wait_for_drain(DRAIN_TIMEOUT).await {
        info!("drained, gateway stopped");
    } else {
        warn!(
            remaining = controller.in_flight_count(),
            "drain timeout expired with store work still running"
        );
    }
}
