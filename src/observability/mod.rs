//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher, error handler, health checker produce:
//!     → logging.rs (structured log events, one line per backend per health cycle)
//!     → metrics.rs (counters, gauges)
//! HTTP layer adds:
//!     → x-request-id on every request and response
//!     → TraceLayer spans
//! ```

pub mod logging;
pub mod metrics;
