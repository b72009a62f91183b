use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// A flag polled by long running computations. The host sets it, the computation only reads it.
pub trait CancellationFlag {
    fn is_canceled(&self) -> bool;
}

impl CancellationFlag for AtomicBool {
    fn is_canceled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl<T: CancellationFlag + ?Sized> CancellationFlag for Arc<T> {
    fn is_canceled(&self) -> bool {
        (**self).is_canceled()
    }
}

impl<T: CancellationFlag + ?Sized> CancellationFlag for &T {
    fn is_canceled(&self) -> bool {
        (**self).is_canceled()
    }
}

/// A flag that is never raised.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverCancel;

impl CancellationFlag for NeverCancel {
    fn is_canceled(&self) -> bool {
        false
    }
}

/// Returned instead of a partial result when the computation observed a raised cancellation flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("The computation was canceled")]
pub struct Canceled;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        assert!(!flag.is_canceled());
        flag.store(true, Ordering::Relaxed);
        assert!(flag.is_canceled());
        assert!(!NeverCancel.is_canceled());
    }
}
