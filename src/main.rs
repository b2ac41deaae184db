//! http-guard server.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client Request
//!   ──────────────▶ net::listener ──▶ http::request (id, span)
//!                                        │
//!                      ┌─────────────────┴──────────────────┐
//!                      │ production          development    │
//!                      │ security headers    diagnostics    │
//!                      │ HSTS                page           │
//!                      │ permissions policy                 │
//!                      │ CORS                               │
//!                      │ size guard                         │
//!                      └─────────────────┬──────────────────┘
//!                                        ▼
//!                              exception boundary
//!                                        ▼
//!                               HTTPS redirection
//!                                        ▼
//!                         routes (+ validation filter)
//! ```

use std::path::PathBuf;

use clap::Parser;

use http_guard::config::validation::validate_config;
use http_guard::config::{load_config, ConfigError, Environment, GuardConfig};
use http_guard::lifecycle::{signals, Shutdown};
use http_guard::net::Listener;
use http_guard::observability::{logging, metrics};
use http_guard::{app, HttpServer};

#[derive(Parser)]
#[command(name = "http-guard")]
#[command(about = "HTTP server with a hardened middleware pipeline", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "HTTP_GUARD_CONFIG")]
    config: Option<PathBuf>,

    /// Override the bind address.
    #[arg(short, long, env = "HTTP_GUARD_BIND")]
    bind: Option<String>,

    /// Override the hosting environment (development or production).
    #[arg(short, long, env = "HTTP_GUARD_ENVIRONMENT")]
    environment: Option<Environment>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GuardConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }
    if let Some(environment) = cli.environment {
        config.environment = environment;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability, config.environment);

    tracing::info!("http-guard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.server.bind_address,
        environment = %config.environment,
        max_connections = config.server.max_connections,
        max_request_bytes = config.limits.max_request_bytes,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = Listener::bind(&config.server).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_termination().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config, app::routes());
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
