//! Graceful shutdown coordinator
//!
//! Every request runs under a child of the coordinator's root token, so
//! starting shutdown cancels in-flight store operations and streams.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Shutdown state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Running,
    ShuttingDown,
    Shutdown,
}

/// Graceful shutdown coordinator
#[derive(Debug)]
pub struct ShutdownCoordinator {
    state: RwLock<ShutdownState>,
    root: CancellationToken,
    timeout: Duration,
}

impl ShutdownCoordinator {
    /// `timeout` bounds how long `run_until_shutdown` waits for a task to drain.
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: RwLock::new(ShutdownState::Running),
            root: CancellationToken::new(),
            timeout,
        }
    }

    /// A token that fires when shutdown starts
    pub fn token(&self) -> CancellationToken {
        self.root.child_token()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Initiate graceful shutdown
    pub async fn shutdown(&self) {
        let mut state = self.state.write().await;
        if *state != ShutdownState::Running {
            warn!("Shutdown already in progress");
            return;
        }

        info!("Initiating graceful shutdown");
        *state = ShutdownState::ShuttingDown;
        drop(state);

        self.root.cancel();
    }

    /// Mark shutdown as finished
    pub async fn complete(&self) {
        *self.state.write().await = ShutdownState::Shutdown;
        info!("Shutdown complete");
    }

    /// Check if shutdown is in progress
    pub async fn is_shutting_down(&self) -> bool {
        *self.state.read().await != ShutdownState::Running
    }

    /// Get current state
    pub async fn state(&self) -> ShutdownState {
        *self.state.read().await
    }

    /// Wait for shutdown signal
    pub async fn wait_for_shutdown(&self) {
        self.root.cancelled().await;
    }

    /// Drive `task` until it finishes on its own or shutdown starts and the
    /// drain timeout runs out, whichever comes first.
    pub async fn run_until_shutdown<F, T>(&self, component: &str, task: F) -> Option<T>
    where
        F: std::future::Future<Output = T>,
    {
        info!(component, "Starting component");
        tokio::pin!(task);

        let result = tokio::select! {
            out = &mut task => Some(out),
            _ = self.root.cancelled() => {
                info!(component, "Component received shutdown signal, draining");
                match tokio::time::timeout(self.timeout, &mut task).await {
                    Ok(out) => Some(out),
                    Err(_) => {
                        warn!(component, timeout = ?self.timeout, "Component did not drain in time");
                        None
                    }
                }
            }
        };

        self.complete().await;
        result
    }
}

/// Install signal handlers for graceful shutdown
#[cfg(unix)]
pub fn install_signal_handlers(coordinator: Arc<ShutdownCoordinator>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    error!("Failed to install signal handlers: {}", e);
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM"),
            _ = sigint.recv() => info!("Received SIGINT"),
        }
        coordinator.shutdown().await;
    });
}

/// Install signal handlers for graceful shutdown (Windows)
#[cfg(windows)]
pub fn install_signal_handlers(coordinator: Arc<ShutdownCoordinator>) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            return;
        }
        info!("Received Ctrl+C");
        coordinator.shutdown().await;
    });
}
