//! Backend pool management.
//!
//! # Responsibilities
//! - Own the fixed, ordered set of backends
//! - Apply round-robin selection over live backends
//! - Mutate liveness by backend address

use std::sync::Arc;

use url::Url;

use crate::config::validation::{parse_backend_url, ValidationError};
use crate::load_balancer::{backend::Backend, round_robin::RoundRobin};
use crate::proxy::forward::Forwarder;

/// Errors raised by pool construction and selection.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("server pool requires at least one backend")]
    Empty,
    #[error(transparent)]
    InvalidBackend(#[from] ValidationError),
    #[error("no backends available")]
    NoBackendsAvailable,
}

/// The fixed set of backends and the shared round-robin cursor.
#[derive(Debug)]
pub struct ServerPool {
    backends: Vec<Arc<Backend>>,
    selector: RoundRobin,
}

impl ServerPool {
    /// Create a pool from a non-empty list of backends.
    pub fn new(backends: Vec<Backend>) -> Result<Self, PoolError> {
        if backends.is_empty() {
            return Err(PoolError::Empty);
        }
        Ok(Self {
            backends: backends.into_iter().map(Arc::new).collect(),
            selector: RoundRobin::new(),
        })
    }

    /// Create a pool from backend origin strings sharing one forwarder.
    pub fn from_addresses<S: AsRef<str>>(
        addresses: &[S],
        forwarder: Arc<dyn Forwarder>,
    ) -> Result<Self, PoolError> {
        let backends = addresses
            .iter()
            .map(|address| -> Result<Backend, PoolError> {
                let url = parse_backend_url(address.as_ref())?;
                tracing::info!(backend = %url, "Configured backend");
                Ok(Backend::new(url, forwarder.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(backends)
    }

    /// Append a backend. Only possible before the pool is shared.
    pub fn add_backend(&mut self, backend: Backend) {
        self.backends.push(Arc::new(backend));
    }

    /// Advance the cursor and return the index it now points at.
    pub fn next_index(&self) -> usize {
        self.selector.next_index(self.backends.len())
    }

    /// Next live backend in round-robin order.
    ///
    /// Scans at most one full cycle; when every backend is dead the request
    /// fails with [`PoolError::NoBackendsAvailable`] instead of waiting.
    pub fn get_next_peer(&self) -> Result<Arc<Backend>, PoolError> {
        self.selector
            .next_alive(&self.backends)
            .ok_or(PoolError::NoBackendsAvailable)
    }

    /// Set liveness of the backend at `address`; unknown addresses are ignored.
    pub fn mark_backend_status(&self, address: &Url, alive: bool) {
        if let Some(backend) = self.backends.iter().find(|b| b.address() == address) {
            backend.set_alive(alive);
        }
    }

    /// All backends in pool order (for health checking).
    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Number of backends currently believed alive.
    pub fn alive_count(&self) -> usize {
        self.backends.iter().filter(|b| b.is_alive()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::testing::EchoForwarder;

    fn pool(addrs: &[&str]) -> ServerPool {
        ServerPool::from_addresses(addrs, Arc::new(EchoForwarder)).unwrap()
    }

    fn url(addr: &str) -> Url {
        Url::parse(addr).unwrap()
    }

    const A: &str = "http://127.0.0.1:8081";
    const B: &str = "http://127.0.0.1:8082";

    #[test]
    fn two_backends_alternate_starting_with_second() {
        let pool = pool(&[A, B]);

        assert_eq!(pool.get_next_peer().unwrap().address(), &url(B));
        assert_eq!(pool.get_next_peer().unwrap().address(), &url(A));
        assert_eq!(pool.get_next_peer().unwrap().address(), &url(B));
    }

    #[test]
    fn dead_backend_is_never_selected() {
        let pool = pool(&[A, B]);
        pool.mark_backend_status(&url(A), false);

        for _ in 0..50 {
            assert_eq!(pool.get_next_peer().unwrap().address(), &url(B));
        }

        pool.mark_backend_status(&url(A), true);
        let picks: Vec<Url> = (0..2)
            .map(|_| pool.get_next_peer().unwrap().address().clone())
            .collect();
        assert!(picks.contains(&url(A)));
    }

    #[test]
    fn all_dead_pool_fails_selection() {
        let pool = pool(&[A, B]);
        pool.mark_backend_status(&url(A), false);
        pool.mark_backend_status(&url(B), false);

        assert!(matches!(pool.get_next_peer(), Err(PoolError::NoBackendsAvailable)));
        assert_eq!(pool.alive_count(), 0);
    }

    #[test]
    fn mark_is_idempotent_and_ignores_unknown() {
        let pool = pool(&[A, B]);
        pool.mark_backend_status(&url(A), false);
        pool.mark_backend_status(&url(A), false);
        pool.mark_backend_status(&url("http://10.9.9.9:1"), false);

        assert!(!pool.backends()[0].is_alive());
        assert!(pool.backends()[1].is_alive());
        assert_eq!(pool.alive_count(), 1);
    }

    #[test]
    fn construction_rejects_empty_and_invalid() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            ServerPool::from_addresses(&empty, Arc::new(EchoForwarder)),
            Err(PoolError::Empty)
        ));
        assert!(matches!(
            ServerPool::from_addresses(&["nope"], Arc::new(EchoForwarder)),
            Err(PoolError::InvalidBackend(_))
        ));
    }

    #[test]
    fn add_backend_extends_rotation() {
        let mut pool = pool(&[A]);
        pool.add_backend(Backend::new(url(B), Arc::new(EchoForwarder)));

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.next_index(), 1);
        assert_eq!(pool.next_index(), 0);
    }

    #[test]
    fn one_live_backend_is_always_found_under_contention() {
        let pool = Arc::new(pool(&[A, B]));
        pool.mark_backend_status(&url(B), false);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = pool.clone();
                std::thread::spawn(move || {
                    (0..100_000)
                        .filter(|_| pool.get_next_peer().is_err())
                        .count()
                })
            })
            .collect();

        let failures: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(failures, 0);
    }

    #[test]
    fn concurrent_selection_only_returns_live_backends() {
        let pool = Arc::new(pool(&[A, B, "http://127.0.0.1:8083"]));
        pool.mark_backend_status(&url(B), false);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = pool.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        let peer = pool.get_next_peer().unwrap();
                        assert_ne!(peer.address(), &url(B));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
