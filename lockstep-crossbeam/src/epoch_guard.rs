//! Epoch-based guard using crossbeam-epoch.
//!
//! ```text
//! LazySet<i32, EpochGuard>
//!     │
//!     ├── pin()            epoch::pin() for the whole operation
//!     └── defer_destroy()  freed once every thread pinned before it unpins
//! ```

use crossbeam_epoch::{self as epoch, Guard as CrossbeamGuard};
use lockstep_core::guard::Guard;

/// Epoch-based memory reclamation guard.
///
/// A zero-sized handle onto the global epoch collector. A retired node is
/// freed only after every thread that was pinned when it was retired has
/// unpinned, so an unlocked cursor never lands on freed memory.
///
/// Unlike `DeferredGuard`, memory is reclaimed while the set is alive.
///
/// Retired nodes can outlive the set, so elements must be `'static`.
/// Borrowed elements are fine when the borrow is `'static`:
///
/// ```
/// use lockstep_core::{ConcurrentSet, LazySet};
/// use lockstep_crossbeam::EpochGuard;
///
/// static VALUE: i32 = 7;
///
/// let set: LazySet<&i32, EpochGuard> = LazySet::new();
/// assert!(set.add(&VALUE));
/// assert!(set.remove(&&VALUE));
/// ```
///
/// A borrow of a local is rejected:
///
/// ```compile_fail
/// use lockstep_core::{ConcurrentSet, LazySet};
/// use lockstep_crossbeam::EpochGuard;
///
/// let value = 7;
/// let set: LazySet<&i32, EpochGuard> = LazySet::new();
/// set.add(&value);
/// set.remove(&&value);
/// ```
///
#[derive(Debug, Clone, Copy, Default)]
pub struct EpochGuard;

impl Guard for EpochGuard {
    type ReadGuard = CrossbeamGuard;

    fn pin() -> Self::ReadGuard {
        epoch::pin()
    }

    unsafe fn defer_destroy<N: 'static>(&self, node: *mut N, dealloc: unsafe fn(*mut N)) {
        let guard = epoch::pin();
        unsafe {
            guard.defer_unchecked(move || dealloc(node));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serial_test::serial;

    use super::*;

    struct Tracked(Arc<AtomicUsize>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    unsafe fn free_tracked(ptr: *mut Tracked) {
        drop(unsafe { Box::from_raw(ptr) });
    }

    fn collect_until(drops: &AtomicUsize, expected: usize) -> bool {
        for _ in 0..10_000 {
            if drops.load(Ordering::SeqCst) >= expected {
                return true;
            }
            epoch::pin().flush();
        }
        drops.load(Ordering::SeqCst) >= expected
    }

    #[test]
    #[serial]
    fn test_retired_node_is_eventually_freed() {
        let drops = Arc::new(AtomicUsize::new(0));
        let guard = EpochGuard;
        let ptr = Box::into_raw(Box::new(Tracked(Arc::clone(&drops))));

        unsafe { guard.defer_destroy(ptr, free_tracked) };

        assert!(collect_until(&drops, 1));
    }

    #[test]
    #[serial]
    fn test_pinned_reader_delays_reclamation() {
        let drops = Arc::new(AtomicUsize::new(0));
        let guard = EpochGuard;
        let ptr = Box::into_raw(Box::new(Tracked(Arc::clone(&drops))));

        let reader = EpochGuard::pin();
        unsafe { guard.defer_destroy(ptr, free_tracked) };
        for _ in 0..100 {
            epoch::pin().flush();
        }
        assert_eq!(drops.load(Ordering::SeqCst), 0);

        drop(reader);
        assert!(collect_until(&drops, 1));
    }
}
