//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream origin
//! - Track liveness behind a reader-writer lock
//! - Forward requests through the shared forwarding capability

use std::sync::{Arc, PoisonError, RwLock};

use axum::body::Body;
use axum::http::Response;
use url::Url;

use crate::proxy::forward::{Forwarder, ProxiedRequest, TransportError};

/// A single backend server.
#[derive(Debug)]
pub struct Backend {
    /// Origin this backend receives traffic on.
    address: Url,
    /// Liveness; readers never block each other, a write excludes everyone.
    alive: RwLock<bool>,
    forwarder: Arc<dyn Forwarder>,
}

impl Backend {
    /// Create a new backend, initially alive.
    pub fn new(address: Url, forwarder: Arc<dyn Forwarder>) -> Self {
        Self {
            address,
            alive: RwLock::new(true),
            forwarder,
        }
    }

    /// The backend origin.
    pub fn address(&self) -> &Url {
        &self.address
    }

    pub fn set_alive(&self, alive: bool) {
        // A panicking writer cannot leave a bool half-written.
        *self.alive.write().unwrap_or_else(PoisonError::into_inner) = alive;
    }

    pub fn is_alive(&self) -> bool {
        *self.alive.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forward a request to this backend.
    pub async fn forward(&self, request: &ProxiedRequest) -> Result<Response<Body>, TransportError> {
        self.forwarder.forward(&self.address, request).await
    }
}
