//! Shared work queue over account indices.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Hands out indices `0..total`, each exactly once, to any number of workers.
///
/// The cursor only moves forward; once it passes `total` every further
/// claim returns `None`.
#[derive(Debug)]
pub struct WorkQueue {
    next: AtomicUsize,
    total: usize,
}

impl WorkQueue {
    /// Creates a queue over `0..total`.
    #[must_use]
    pub const fn new(total: usize) -> Self {
        Self {
            next: AtomicUsize::new(0),
            total,
        }
    }

    /// Claims the next index, or `None` when the queue is exhausted.
    pub fn claim(&self) -> Option<usize> {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        (index < self.total).then_some(index)
    }

    /// Number of indices in the queue.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    /// Number of indices handed out so far.
    #[must_use]
    pub fn claimed(&self) -> usize {
        self.next.load(Ordering::Relaxed).min(self.total)
    }
}
