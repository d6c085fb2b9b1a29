//! failover-lb
//!
//! A Layer-7 load balancer built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!                     │                 LOAD BALANCER                │
//!   Client Request    │  ┌─────────┐   ┌────────────┐   ┌─────────┐  │
//!   ──────────────────┼─▶│  http   │──▶│ dispatcher │──▶│  pool   │  │
//!                     │  │ server  │   │  (attempts)│   │  (RR)   │  │
//!                     │  └─────────┘   └─────┬──────┘   └────┬────┘  │
//!                     │                      │ failure       │ peer  │
//!                     │                      ▼               ▼       │
//!   Client Response   │               ┌──────────────┐  ┌─────────┐  │
//!   ◀─────────────────┼───────────────│error handler │◀─│ backend │◀─┼── Backend
//!                     │               │retry/failover│  │ forward │  │   Server
//!                     │               └──────────────┘  └────▲────┘  │
//!                     │                                      │alive  │
//!                     │                              ┌───────┴──────┐│
//!                     │                              │health checker││
//!                     │                              └──────────────┘│
//!                     └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use failover_lb::config::{loader, BalancerConfig};
use failover_lb::lifecycle::startup;
use failover_lb::observability::logging;

#[derive(Parser)]
#[command(name = "failover-lb")]
#[command(about = "Round-robin HTTP load balancer with retries and health checks", long_about = None)]
struct Cli {
    /// TOML configuration file; positional arguments override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Port to listen on
    port: Option<u16>,

    /// Backend origins, e.g. http://127.0.0.1:8081
    backends: Vec<String>,
}

impl Cli {
    fn into_config(self) -> Result<BalancerConfig, loader::ConfigError> {
        let mut config = match &self.config {
            Some(path) => loader::read_config(path)?,
            None => BalancerConfig::default(),
        };

        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if !self.backends.is_empty() {
            config.backends = self.backends;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }

        loader::finalize(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.bind_address(),
        backends = config.backends.len(),
        health_interval_secs = config.health_check.interval_secs,
        "Configuration loaded"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
