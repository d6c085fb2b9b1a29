//! Alive-aware round-robin selection.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancer::backend::Backend;

/// Round-robin selector.
/// Stores a shared cursor; its value modulo the pool length is the last index handed out.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn starting_at(cursor: usize) -> Self {
        Self {
            cursor: AtomicUsize::new(cursor),
        }
    }

    #[cfg(test)]
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    /// Advance the cursor once and map it onto `len` slots.
    ///
    /// # Panics
    /// Panics if `len` is zero.
    pub fn next_index(&self, len: usize) -> usize {
        self.cursor.fetch_add(1, Ordering::SeqCst).wrapping_add(1) % len
    }

    /// Select the next live backend, probing at most one full cycle.
    ///
    /// The cursor advances once per probe, dead backends included, but the
    /// slots checked are the `len` consecutive ones from the first index drawn.
    /// Concurrent callers moving the cursor cannot make a scan skip a slot.
    /// The chosen index becomes the new baseline so the next call resumes just past it.
    pub fn next_alive(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>> {
        let len = backends.len();
        if len == 0 {
            return None;
        }

        let start = self.next_index(len);
        for offset in 0..len {
            if offset > 0 {
                self.cursor.fetch_add(1, Ordering::SeqCst);
            }
            let index = (start + offset) % len;
            let backend = &backends[index];
            if backend.is_alive() {
                self.cursor.store(index, Ordering::SeqCst);
                return Some(backend.clone());
            }
        }
        None
    }
}
