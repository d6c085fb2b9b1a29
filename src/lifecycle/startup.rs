//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the server pool from validated configuration
//! - Bind the listener
//! - Install signal handling and run until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last, after the pool exists

use tokio::net::TcpListener;

use crate::config::BalancerConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::load_balancer::PoolError;

/// Errors that stop the process before or while serving.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to build server pool: {0}")]
    Pool(#[from] PoolError),
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Start the balancer with a validated configuration and serve until a signal arrives.
pub async fn run(config: BalancerConfig) -> Result<(), StartupError> {
    let address = config.bind_address();
    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    server.run(listener, server_shutdown).await?;
    Ok(())
}
