//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → TCP connect to each backend, one after another
//!     → set_alive(up) on the backend
//!
//! Failure-driven marking (proxy::error_handler):
//!     Forward fails after all retries
//!     → pool.mark_backend_status(addr, false)
//! ```
//!
//! # Design Decisions
//! - Both writers use the backend's own lock; neither coordinates with the other
//! - A health check may revive a backend a failed forward just marked dead
//! - Probe failures are liveness transitions, never errors

pub mod active;

pub use active::HealthChecker;
