//! Per-request attempt accounting.
//!
//! A client request moves through at most `max_attempts` backend-selection
//! rounds, each with at most `max_retries` same-backend retries. The counters
//! travel by value; every step derives a new context instead of mutating one.

use axum::http::Extensions;

/// Attempt and retry counters for one logical client request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestAttemptContext {
    attempts: u32,
    retries: u32,
}

impl RequestAttemptContext {
    /// Fresh context: first attempt, no retries.
    pub const fn new() -> Self {
        Self {
            attempts: 1,
            retries: 0,
        }
    }

    /// Context carried by an inbound request, or a fresh one when absent.
    pub fn from_extensions(extensions: &Extensions) -> Self {
        extensions.get::<Self>().copied().unwrap_or_default()
    }

    /// Backend-selection rounds started so far, starting at 1.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Same-backend retries within the current round, starting at 0.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Context for one more retry against the same backend.
    #[must_use]
    pub fn with_retry(self) -> Self {
        Self {
            retries: self.retries.saturating_add(1),
            ..self
        }
    }

    /// Context for a new selection round; retries start over.
    #[must_use]
    pub fn next_attempt(self) -> Self {
        Self {
            attempts: self.attempts.saturating_add(1),
            retries: 0,
        }
    }
}

impl Default for RequestAttemptContext {
    fn default() -> Self {
        Self::new()
    }
}
