//! Startup orchestration.
//!
//! Config is already loaded and validated by the caller. Order here:
//! logging, metrics, gatekeeper, listener. Any error is fatal.

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::GatekeeperConfig;
use crate::http::{HttpServer, ServerError};
use crate::lifecycle::Shutdown;
use crate::observability::{logging, metrics};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Start everything and serve until shutdown.
pub async fn start(config: GatekeeperConfig) -> Result<(), StartupError> {
    logging::init(&config.observability);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        mode = ?config.mode,
        site = %config.downstream.site_url,
        authority = %config.auth.authority_url,
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

    let address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    let shutdown = Shutdown::new();
    server
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)
}
