//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher needs a peer
//!     → pool.rs (fixed ordered backends)
//!     → round_robin.rs (advance shared cursor, skip dead backends)
//!     → backend.rs (liveness check, forward)
//!     → Return live backend or NoBackendsAvailable
//! ```
//!
//! # Design Decisions
//! - Pool membership is fixed at startup; no locking for iteration
//! - The cursor is the only shared selection state (atomic, lock-free)
//! - Liveness is per backend, written by health checks and failed forwards
//! - Selection gives up after one full cycle of dead backends

pub mod backend;
pub mod pool;
pub mod round_robin;

pub use backend::Backend;
pub use pool::{PoolError, ServerPool};
