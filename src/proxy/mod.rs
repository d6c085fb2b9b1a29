//! Request dispatch and failover subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (buffered)
//!     → context.rs (attempt/retry counters, default {1, 0})
//!     → dispatcher.rs (attempt budget check, pool.get_next_peer())
//!     → error_handler.rs (forward; on transport error retry or mark dead)
//!     → forward.rs (rewrite onto backend origin, send)
//!     → backend response, or 503 once attempts run out
//! ```

pub mod context;
pub mod dispatcher;
pub mod error_handler;
pub mod forward;

#[cfg(test)]
pub(crate) mod testing;

pub use context::RequestAttemptContext;
pub use dispatcher::Dispatcher;
pub use error_handler::{AttemptOutcome, ErrorHandler};
pub use forward::{BufferError, Forwarder, HyperForwarder, ProxiedRequest, TransportError};
