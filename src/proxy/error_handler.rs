//! Retry/failover decisions for failed forwards.
//!
//! # States
//! ```text
//! ATTEMPT_ACTIVE
//!     → transport error, retries < max_retries → RETRY_SAME_BACKEND (wait, retry)
//!     → transport error, retries exhausted    → MARK_DEAD_AND_REATTEMPT
//! MARK_DEAD_AND_REATTEMPT
//!     → backend marked dead, attempts + 1, control back to the dispatcher
//! ```
//! The dispatcher owns the terminal check on attempts.

use std::sync::Arc;

use axum::body::Body;
use axum::http::Response;

use crate::load_balancer::{Backend, ServerPool};
use crate::observability::metrics;
use crate::proxy::context::RequestAttemptContext;
use crate::proxy::forward::ProxiedRequest;
use crate::resilience::RetryPolicy;

/// Result of one attempt against one backend.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// The backend answered; the response goes to the client as is.
    Completed(Response<Body>),
    /// The backend was marked dead; select another with this context.
    Escalate(RequestAttemptContext),
}

/// Drives one attempt: forward, retry the same backend, or give the backend up.
#[derive(Debug, Clone)]
pub struct ErrorHandler {
    pool: Arc<ServerPool>,
    policy: RetryPolicy,
}

impl ErrorHandler {
    pub fn new(pool: Arc<ServerPool>, policy: RetryPolicy) -> Self {
        Self { pool, policy }
    }

    /// Forward to `backend`, retrying transport failures up to the policy limit.
    pub async fn run_attempt(
        &self,
        backend: &Backend,
        request: &ProxiedRequest,
        mut ctx: RequestAttemptContext,
    ) -> AttemptOutcome {
        loop {
            let error = match backend.forward(request).await {
                Ok(response) => return AttemptOutcome::Completed(response),
                Err(e) => e,
            };

            tracing::warn!(
                backend = %backend.address(),
                path = %request.path(),
                attempt = ctx.attempts(),
                retry = ctx.retries(),
                error = %error,
                "Forward failed"
            );

            if self.policy.may_retry(ctx) {
                // Only this request's task sleeps.
                tokio::time::sleep(self.policy.retry_delay).await;
                ctx = ctx.with_retry();
                metrics::record_retry(backend.address().as_str());
                continue;
            }

            self.pool.mark_backend_status(backend.address(), false);
            metrics::record_escalation(backend.address().as_str());

            let next = ctx.next_attempt();
            tracing::info!(
                backend = %backend.address(),
                path = %request.path(),
                client = ?request.client_addr,
                attempt = next.attempts(),
                "Backend marked down, attempting another backend"
            );
            return AttemptOutcome::Escalate(next);
        }
    }
}
