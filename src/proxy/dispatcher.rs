//! Request dispatch.
//!
//! # Responsibilities
//! - Check the attempt budget before every selection round
//! - Pick the next live backend and run one attempt against it
//! - Always produce a response: the backend's, or 503
//!
//! # Design Decisions
//! - Failover is a loop, not re-entry; attempts strictly increase so it ends
//! - An empty selection (all backends dead) ends the request immediately

use std::sync::Arc;

use axum::body::Body;
use axum::http::Response;

use crate::http::response::service_unavailable;
use crate::load_balancer::ServerPool;
use crate::proxy::context::RequestAttemptContext;
use crate::proxy::error_handler::{AttemptOutcome, ErrorHandler};
use crate::proxy::forward::ProxiedRequest;
use crate::resilience::RetryPolicy;

/// Entry point for every proxied request.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    pool: Arc<ServerPool>,
    errors: ErrorHandler,
    policy: RetryPolicy,
}

impl Dispatcher {
    pub fn new(pool: Arc<ServerPool>, policy: RetryPolicy) -> Self {
        Self {
            errors: ErrorHandler::new(pool.clone(), policy),
            pool,
            policy,
        }
    }

    /// Serve `request`, starting from the attempt state in `ctx`.
    pub async fn handle(
        &self,
        request: &ProxiedRequest,
        mut ctx: RequestAttemptContext,
    ) -> Response<Body> {
        loop {
            if self.policy.attempts_exhausted(ctx) {
                tracing::warn!(
                    client = ?request.client_addr,
                    path = %request.path(),
                    attempts = ctx.attempts(),
                    "Max attempts reached, terminating"
                );
                return service_unavailable();
            }

            let peer = match self.pool.get_next_peer() {
                Ok(peer) => peer,
                Err(e) => {
                    tracing::warn!(
                        path = %request.path(),
                        backends = self.pool.len(),
                        alive = self.pool.alive_count(),
                        error = %e,
                        "No live backend to dispatch to"
                    );
                    return service_unavailable();
                }
            };

            tracing::debug!(
                backend = %peer.address(),
                method = %request.method,
                path = %request.path(),
                attempt = ctx.attempts(),
                "Dispatching request"
            );

            match self.errors.run_attempt(&peer, request, ctx).await {
                AttemptOutcome::Completed(response) => return response,
                AttemptOutcome::Escalate(next) => ctx = next,
            }
        }
    }
}
