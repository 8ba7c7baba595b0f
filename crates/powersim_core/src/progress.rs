//! Shared progress and cancellation for long-running searches and sweeps.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Progress counter and cancel flag shared between a worker and its caller.
///
/// Clones share the same atomics, so a reporter thread can hold one clone while the
/// engine updates another.
#[derive(Debug, Clone)]
pub struct Progress {
    completed: Arc<AtomicUsize>,
    total: Arc<AtomicUsize>,
    cancelled: Arc<AtomicBool>,
}

impl Progress {
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            completed: Arc::new(AtomicUsize::new(0)),
            total: Arc::new(AtomicUsize::new(total)),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    /// Expected units of work; 0 when unknown (open-ended searches)
    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Record one finished unit (a search step or a sweep cell)
    pub fn increment(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Called by the engine when work starts, so one handle can be reused
    pub fn reset(&self, total: usize) {
        self.completed.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    /// Ask the engine to stop; it checks before each step or cell
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Completed fraction in `[0, 1]`, or `None` when the total is unknown
    #[must_use]
    pub fn fraction(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| (self.completed() as f64 / total as f64).min(1.0))
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new(0)
    }
}
