//! Retry policy.
//!
//! # Responsibilities
//! - Bound same-backend retries within one attempt
//! - Bound backend-selection attempts per client request
//! - Hold the fixed delay between same-backend retries
//!
//! # Design Decisions
//! - Fixed delay, no exponential growth or jitter
//! - Only transport errors are retried; any backend response is final

use std::time::Duration;

use crate::config::RetryConfig;
use crate::proxy::context::RequestAttemptContext;

/// Limits for the retry/failover state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Same-backend retries before the backend is marked dead.
    pub max_retries: u32,
    /// Selection rounds before the request is answered with 503.
    pub max_attempts: u32,
    /// Pause before each same-backend retry.
    pub retry_delay: Duration,
}

impl RetryPolicy {
    /// True while another same-backend retry is allowed.
    pub fn may_retry(&self, ctx: RequestAttemptContext) -> bool {
        ctx.retries() < self.max_retries
    }

    /// True once the request has used up its selection rounds.
    pub fn attempts_exhausted(&self, ctx: RequestAttemptContext) -> bool {
        ctx.attempts() > self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            max_attempts: config.max_attempts,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}
