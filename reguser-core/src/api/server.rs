//! HTTP server

use super::routes::build_router;
use super::state::AppState;
use crate::config::Config;
use crate::repos::Registry;
use anyhow::Result;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// HTTP front end over a `Registry`
pub struct ApiServer {
    state: Arc<AppState>,
    addr: SocketAddr,
}

impl ApiServer {
    /// `shutdown` stops accepting connections and cancels every in-flight request
    pub fn new(config: &Config, registry: Registry, shutdown: CancellationToken) -> Self {
        let state = Arc::new(AppState::new(registry, config.auth.clone(), shutdown));
        Self {
            state,
            addr: config.server.bind_address,
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Bind the configured address and serve until shutdown
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until shutdown
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let local = listener.local_addr()?;
        info!("API listening on {}", local);

        let shutdown = self.state.shutdown_token().clone();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("API server stopped");
        Ok(())
    }
}
