//! HTTP server setup.
//!
//! # Responsibilities
//! - Wrap application routes in the stage pipeline
//! - Accept connections and serve them on background tasks
//! - Drain in-flight connections on shutdown, bounded by a deadline

use std::time::Duration;

use axum::Router;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::sync::broadcast;

use crate::config::GuardConfig;
use crate::http::pipeline::{self, PipelineSettings};
use crate::net::{spawn_connection, Listener, ListenerError};

/// Pause after a failed accept (e.g. descriptor exhaustion).
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// HTTP server running the guarded pipeline.
pub struct HttpServer {
    app: Router,
    config: GuardConfig,
}

impl HttpServer {
    /// Create a server for `routes` wrapped in the pipeline built from `config`.
    pub fn new(config: GuardConfig, routes: Router) -> Self {
        let settings = PipelineSettings::from(&config);
        let app = pipeline::build(routes, &settings);
        Self { app, config }
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Run until a shutdown signal arrives, then drain.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = %self.config.environment,
            "HTTP server starting"
        );

        let graceful = GracefulShutdown::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => {
                        spawn_connection(stream, peer, permit, self.app.clone(), &graceful);
                    }
                    Err(ListenerError::Closed) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
            }
        }

        drop(listener);

        let deadline = Duration::from_secs(self.config.server.shutdown_timeout_secs);
        tokio::select! {
            _ = graceful.shutdown() => tracing::info!("All connections drained"),
            _ = tokio::time::sleep(deadline) => {
                tracing::warn!(timeout_secs = deadline.as_secs(), "Shutdown deadline reached, dropping open connections");
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
