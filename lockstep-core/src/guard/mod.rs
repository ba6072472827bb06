//! Guard trait for memory reclamation strategies.
//!
//! The optimistic and lazy sets traverse the chain without holding locks, so a
//! node unlinked by one thread may still be under another thread's cursor. The
//! `Guard` trait abstracts over how such nodes are kept alive until no thread
//! can observe them any more.
//!
//! ```text
//! OptimisticSet<T, G: Guard>
//!     │
//!     ├── OptimisticSet<T, EpochGuard>      (production, lockstep-crossbeam)
//!     └── OptimisticSet<T, DeferredGuard>   (testing)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use lockstep_core::{ConcurrentSet, LazySet};
//! use lockstep_crossbeam::EpochGuard;
//!
//! let set: LazySet<i32, EpochGuard> = LazySet::new();
//! set.add(42);
//! ```

mod deferred_guard;

pub use deferred_guard::DeferredGuard;

/// A memory reclamation guard that protects concurrent access to nodes.
///
/// # Safety Contract
///
/// Implementations must ensure that nodes passed to `defer_destroy` are not
/// freed while any thread holding a `ReadGuard` pinned before the call may
/// still dereference them.
///
/// # Design Note
///
/// Guards are stored in sets and must be `Send + Sync`. The stored guard is
/// used for scheduling deferred destruction. Thread pinning happens per
/// operation through `pin()`.
///
pub trait Guard: Sized + Default + Send + Sync {
    /// An active guard that protects reads for its lifetime.
    ///
    /// Held across the whole operation, retries included.
    ///
    type ReadGuard: Sized;

    /// Pin an active read guard.
    fn pin() -> Self::ReadGuard;

    /// Schedule a node for deferred destruction.
    ///
    /// # Safety
    ///
    /// - `node` must be a valid pointer previously allocated by the set
    /// - `node` must be unlinked (not reachable by a traversal starting now)
    /// - `node` must be retired at most once
    /// - `dealloc` must be the correct deallocation function for `node`
    ///
    /// `N: 'static` because the destruction may run on another thread after
    /// any borrow held by the node has ended.
    ///
    unsafe fn defer_destroy<N: 'static>(&self, node: *mut N, dealloc: unsafe fn(*mut N));
}
