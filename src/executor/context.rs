//! The execution context: a fixed-parallelism handle the scheduler consults
//! for its worker count and liveness (spec §5/§6).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A user-supplied handle describing how much parallelism to use and
/// whether the job should keep running. Cheap to clone (shares an `Arc`
/// internally); `deactivate` is typically called from outside the job
/// (e.g. a timeout watcher) to request cooperative cancellation.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    parallelism: usize,
    active: Arc<AtomicBool>,
}

impl ExecutionContext {
    /// `parallelism` is clamped to at least 1: `max(1, parallelism)` is how
    /// the scheduler reads it anyway, but clamping here keeps the context
    /// self-consistent for callers inspecting it directly.
    pub fn new(parallelism: usize) -> Self {
        ExecutionContext {
            parallelism: parallelism.max(1),
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    /// A context with parallelism equal to the available core count.
    pub fn default_parallelism() -> Self {
        let n = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        ExecutionContext::new(n)
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Requests cooperative cancellation of any job currently running
    /// against this context.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallelism_is_clamped_to_at_least_one() {
        let ctx = ExecutionContext::new(0);
        assert_eq!(ctx.parallelism(), 1);
    }

    #[test]
    fn deactivate_is_observed_through_clones() {
        let ctx = ExecutionContext::new(4);
        let clone = ctx.clone();
        clone.deactivate();
        assert!(!ctx.is_active());
    }
}
