//! TCP listener
//!
//! Accepts connections and hands each one to its own task running
//! [`handle_session`]. A semaphore caps the number of live sessions; the
//! listener does not call `accept` while the cap is reached, so extra
//! clients queue in the kernel backlog. A cap of 1 reproduces strictly
//! sequential handling.

use crate::config::{Config, MAX_CONNECTIONS_LIMIT};
use crate::error::{ServerError, ServerResult};
use crate::session::{handle_session, SessionContext};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

/// Pause after a failed `accept` before trying again
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// A bound gateway listener
pub struct Server {
    listener: TcpListener,
    ctx: Arc<SessionContext>,
    max_connections: usize,
    shutdown_timeout: Duration,
}

impl Server {
    /// Bind `host:port`
    ///
    /// Failing to bind is fatal for the process.
    pub async fn bind(
        host: &str,
        port: u16,
        ctx: SessionContext,
        max_connections: usize,
        shutdown_timeout: Duration,
    ) -> ServerResult<Self> {
        let listener = TcpListener::bind((host, port))
            .await
            .map_err(|source| ServerError::Bind {
                addr: format!("{host}:{port}"),
                source,
            })?;

        Ok(Self {
            listener,
            ctx: Arc::new(ctx),
            max_connections: max_connections.clamp(1, MAX_CONNECTIONS_LIMIT),
            shutdown_timeout,
        })
    }

    /// Bind using the listener settings in `config`
    pub async fn from_config(config: &Config, ctx: SessionContext) -> ServerResult<Self> {
        Self::bind(
            &config.server.host,
            config.server.port,
            ctx,
            config.server.max_connections,
            Duration::from_secs(config.server.shutdown_timeout_secs),
        )
        .await
    }

    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` is cancelled
    ///
    /// After cancellation no new connection is accepted; in-flight sessions
    /// get up to the shutdown timeout to finish.
    pub async fn run(self, shutdown: CancellationToken) -> ServerResult<()> {
        let addr = self.local_addr()?;
        info!(%addr, max_connections = self.max_connections, "Gateway listening");

        let permits = Arc::new(Semaphore::new(self.max_connections));
        let tracker = TaskTracker::new();

        loop {
            let permit = tokio::select! {
                _ = shutdown.cancelled() => break,
                permit = Arc::clone(&permits).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let (stream, peer) = tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!(error = %e, "Failed to accept connection");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                        continue;
                    }
                },
            };

            debug!(%peer, "Connection accepted");
            let ctx = Arc::clone(&self.ctx);
            tracker.spawn(async move {
                let _permit = permit;
                handle_session(stream, peer, &ctx).await;
            });
        }

        drop(self.listener);
        tracker.close();

        info!(in_flight = tracker.len(), "Gateway stopped accepting connections");
        if tokio::time::timeout(self.shutdown_timeout, tracker.wait())
            .await
            .is_err()
        {
            warn!(
                in_flight = tracker.len(),
                timeout_secs = self.shutdown_timeout.as_secs(),
                "Sessions still running at shutdown deadline"
            );
        }

        Ok(())
    }
}

/// Resolve when the process receives Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
