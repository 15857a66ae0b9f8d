//! Shared state for the HTTP API

use crate::config::AuthConfig;
use crate::repos::Registry;
use tokio_util::sync::CancellationToken;

/// Server state shared across requests
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: Registry,

    /// The one credential accepted by every route
    pub auth: AuthConfig,

    /// Fires when the server starts shutting down
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(registry: Registry, auth: AuthConfig, shutdown: CancellationToken) -> Self {
        Self {
            registry,
            auth,
            shutdown,
        }
    }

    /// Token for a single request, cancelled when shutdown starts
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }
}
