//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancer::backend::Backend;

/// Round-robin selector.
///
/// Stores an internal counter to rotate through backends. Dead backends are
/// skipped and the skip advances the counter, so with backend `B` dead the
/// rotation over `[A, B, C]` is `A, C, A, C`.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the next live backend, or `None` if no backend is alive.
    ///
    /// At most `backends.len()` liveness probes are made per attempt. The
    /// counter only grows through a compare-and-swap, so concurrent callers
    /// each claim a distinct slot and never pick from the same stale value.
    pub fn next_server(&self, backends: &[Arc<dyn Backend>]) -> Option<Arc<dyn Backend>> {
        let len = backends.len();
        if len == 0 {
            return None;
        }

        let mut current = self.counter.load(Ordering::Relaxed);
        loop {
            let base = current % len;
            let skipped = (0..len).find(|offset| backends[(base + offset) % len].is_alive())?;
            let index = (base + skipped) % len;
            // On overflow restart at the slot after `index` rather than at 0,
            // which would break the cycle when usize::MAX + 1 is not a multiple of len.
            let next = current.checked_add(skipped + 1).unwrap_or((index + 1) % len);

            match self.counter.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Some(backends[index].clone()),
                Err(actual) => current = actual,
            }
        }
    }
}
