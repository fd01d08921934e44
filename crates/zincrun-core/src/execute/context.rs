//! Cancellation of a running compilation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Handle for cancelling a compilation from another thread.
///
/// `AbortHandle` can be cloned and shared across threads; any clone can
/// trigger the abort, which is visible to all other clones. The driver checks
/// it while waiting for the compiler and kills the process once it is set.
///
/// # Example
///
/// ```
/// use zincrun_core::execute::AbortHandle;
///
/// let handle = AbortHandle::new();
/// let handle_clone = handle.clone();
///
/// assert!(!handle.is_aborted());
///
/// handle_clone.abort();
///
/// assert!(handle.is_aborted());
/// ```
#[derive(Clone, Debug, Default)]
pub struct AbortHandle {
    aborted: Arc<AtomicBool>,
}

impl AbortHandle {
    /// Create a new abort handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if abort has been requested.
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Relaxed)
    }

    /// Request cancellation of the running compilation.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Relaxed);
    }

    /// Reset the abort flag.
    ///
    /// Clears a previous abort so the handle can serve another build.
    pub fn reset(&self) {
        self.aborted.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_visible_across_threads() {
        let handle = AbortHandle::new();
        let remote = handle.clone();

        std::thread::spawn(move || remote.abort()).join().unwrap();
        assert!(handle.is_aborted());

        handle.reset();
        assert!(!handle.is_aborted());
    }
}
