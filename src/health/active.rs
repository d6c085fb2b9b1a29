//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe backends with a raw TCP connect
//! - Update backend liveness based on results

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};
use url::Url;

use crate::config::HealthCheckConfig;
use crate::load_balancer::ServerPool;
use crate::observability::metrics;

pub struct HealthChecker {
    pool: Arc<ServerPool>,
    interval: Duration,
    timeout: Duration,
}

impl HealthChecker {
    pub fn new(pool: Arc<ServerPool>, config: &HealthCheckConfig) -> Self {
        Self {
            pool,
            interval: Duration::from_secs(config.interval_secs),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Run until `shutdown` fires. The first probe happens one interval after start.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval = ?self.interval,
            timeout = ?self.timeout,
            backends = self.pool.len(),
            "Health checker starting"
        );

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tracing::info!("Starting health check");
                    let alive = self.check_all().await;
                    tracing::info!(alive, total = self.pool.len(), "Health check completed");
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health checker received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every backend in pool order and record the result. Returns how many are up.
    pub async fn check_all(&self) -> usize {
        let mut alive_count = 0;

        for backend in self.pool.backends() {
            let alive = is_backend_alive(backend.address(), self.timeout).await;
            backend.set_alive(alive);

            let status = if alive { "up" } else { "down" };
            tracing::info!(backend = %backend.address(), status, "{} [{}]", backend.address(), status);
            metrics::record_backend_health(backend.address().as_str(), alive);

            if alive {
                alive_count += 1;
            }
        }

        alive_count
    }
}

/// True if a TCP connection to the backend's host and port opens within `timeout`.
pub async fn is_backend_alive(address: &Url, timeout: Duration) -> bool {
    let Some(target) = probe_target(address) else {
        tracing::warn!(backend = %address, "Backend address has no host or port");
        return false;
    };

    match time::timeout(timeout, TcpStream::connect(&target)).await {
        Ok(Ok(_stream)) => true,
        Ok(Err(e)) => {
            tracing::debug!(backend = %address, error = %e, "Server unreachable");
            false
        }
        Err(_) => {
            tracing::debug!(backend = %address, ?timeout, "Server unreachable: timeout");
            false
        }
    }
}

/// `host:port` to dial, with the scheme's default port when none is given.
fn probe_target(address: &Url) -> Option<String> {
    let host = address.host_str()?;
    let port = address.port_or_known_default()?;
    Some(format!("{host}:{port}"))
}
