//! Graceful shutdown handling for the hub.
//!
//! On shutdown every live connection is asked to close, then the hub waits a
//! bounded time for the connection tasks to unregister before the HTTP server
//! stops accepting work.

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;

use crate::connection_manager::ConnectionManager;

/// How long to wait for connections to drain
const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Default)]
pub struct ShutdownResult {
    /// Connections asked to close
    pub connections_closed: usize,
    /// Connections still registered when the drain timed out
    pub connections_remaining: usize,
    pub duration: Duration,
}

/// Closes the live connections of a hub
pub struct GracefulShutdown {
    connections: Arc<ConnectionManager>,
    drain_timeout: Duration,
}

impl GracefulShutdown {
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self {
            connections,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    pub fn with_drain_timeout(connections: Arc<ConnectionManager>, drain_timeout: Duration) -> Self {
        Self {
            connections,
            drain_timeout,
        }
    }

    #[tracing::instrument(name = "graceful_shutdown", skip(self))]
    pub async fn execute(&self, reason: &str) -> ShutdownResult {
        let start = std::time::Instant::now();
        let live = self.connections.live().snapshot();

        tracing::info!(reason = %reason, connections = live.len(), "Closing live connections");
        for connection in &live {
            connection.close();
        }

        let remaining = self.wait_for_drain().await;
        if remaining > 0 {
            tracing::warn!(remaining, "Connections still open after drain timeout");
        }

        let result = ShutdownResult {
            connections_closed: live.len(),
            connections_remaining: remaining,
            duration: start.elapsed(),
        };

        tracing::info!(
            connections_closed = result.connections_closed,
            connections_remaining = result.connections_remaining,
            duration_ms = result.duration.as_millis() as u64,
            "Graceful shutdown completed"
        );
        result
    }

    /// Poll until every connection task has unregistered or the timeout hits
    async fn wait_for_drain(&self) -> usize {
        let live = self.connections.live().clone();
        let drained = tokio::time::timeout(self.drain_timeout, async move {
            while !live.is_empty() {
                tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
            }
        })
        .await;

        match drained {
            Ok(()) => 0,
            Err(_) => self.connections.live().len(),
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM
pub async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
            "ctrl_c"
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
            "sigterm"
        }
    }
}
