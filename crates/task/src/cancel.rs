//! Cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag for one fetch task.
///
/// Cancellation is cooperative, not preemptive: the flag is checked at each
/// suspension boundary of the operation (before the cache read, before the
/// network call, after the response resolves) and by the scheduler before
/// delivery. Network I/O already in flight is never forcibly killed; a result
/// that completes after cancellation is discarded rather than delivered.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent; there is no un-cancel.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
