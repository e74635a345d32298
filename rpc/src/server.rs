//! Axum-based HTTP server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::backend::LedgerBackend;
use crate::error::RpcError;
use crate::handlers::{self, ApiState};

/// Build the router for `backend`.
pub fn router<B: LedgerBackend>(backend: Arc<B>, metrics_enabled: bool) -> Router {
    let state = ApiState {
        backend,
        metrics_enabled,
    };
    Router::new()
        .route("/submitIntent", post(handlers::submit_intent::<B>))
        .route("/latestBlock", get(handlers::latest_block::<B>))
        .route("/blocks", get(handlers::blocks::<B>))
        .route("/masterLedger", get(handlers::master_ledger::<B>))
        .route("/app_data", get(handlers::app_data::<B>))
        .route("/generateBlock", post(handlers::generate_block::<B>))
        .route("/metrics", get(handlers::metrics::<B>))
        .route("/health", get(handlers::health::<B>))
        .with_state(state)
}

pub struct RpcServer<B> {
    backend: Arc<B>,
    metrics_enabled: bool,
}

impl<B: LedgerBackend> RpcServer<B> {
    pub fn new(backend: Arc<B>, metrics_enabled: bool) -> Self {
        Self {
            backend,
            metrics_enabled,
        }
    }

    /// Bind to `addr`.
    pub async fn bind(addr: SocketAddr) -> Result<TcpListener, RpcError> {
        TcpListener::bind(addr)
            .await
            .map_err(|e| RpcError::Server(format!("failed to bind {addr}: {e}")))
    }

    /// Serve on `listener` until `shutdown` resolves. In-flight requests
    /// are allowed to finish.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local = listener
            .local_addr()
            .map_err(|e| RpcError::Server(e.to_string()))?;
        info!(addr = %local, metrics = self.metrics_enabled, "HTTP server listening");

        let app = router(self.backend, self.metrics_enabled);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))?;
        info!("HTTP server stopped");
        Ok(())
    }
}
