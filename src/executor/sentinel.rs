//! Cooperative-abort sentinel: one atomic boolean per job.

use std::sync::atomic::{AtomicBool, Ordering};

/// Shared "is this job still alive" flag. Starts `true`; the first worker
/// to observe a failure flips it to `false` and owns re-raising that
/// failure. Every other worker that later observes `false` treats the job
/// as aborted without having its own failure reported.
#[derive(Debug, Default)]
pub struct Sentinel(AtomicBool);

impl Sentinel {
    pub fn new() -> Self {
        Sentinel(AtomicBool::new(true))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Attempts to flip the sentinel from alive to dead. Returns `true` if
    /// this call is the one that performed the flip (i.e. this worker owns
    /// the error it observed), `false` if another worker already flipped
    /// it first.
    pub fn flip(&self) -> bool {
        self.0
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_first_flip_reports_ownership() {
        let sentinel = Sentinel::new();
        assert!(sentinel.is_alive());
        assert!(sentinel.flip());
        assert!(!sentinel.is_alive());
        assert!(!sentinel.flip());
    }
}
