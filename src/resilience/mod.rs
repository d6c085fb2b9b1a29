//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Forward to backend fails:
//!     → retries.rs (may we retry the same backend?)
//!     → yes: wait retry_delay, retry
//!     → no: backend marked dead, next attempt (if attempts remain)
//! ```
//!
//! # Design Decisions
//! - Limits live in one policy value shared by dispatcher and error handler
//! - Timeouts are enforced by the forwarder and the health probe

pub mod retries;

pub use retries::RetryPolicy;
