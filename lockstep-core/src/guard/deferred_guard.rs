//! Deferred guard implementation for testing.
//!
//! `DeferredGuard` keeps every retired node alive until the guard itself is
//! dropped, which happens when the owning set is dropped.

#[cfg(debug_assertions)]
use std::collections::HashSet;

use parking_lot::Mutex;

use super::Guard;

/// A simple guard that defers all node destruction until the guard is dropped.
///
/// Destruction timing is predictable, which makes it the guard of choice for
/// tests. Memory accumulates for the lifetime of the set, so it does not suit
/// long-running workloads.
///
pub struct DeferredGuard {
    deferred: Mutex<Vec<DeferredNode>>,
    #[cfg(debug_assertions)]
    seen: Mutex<HashSet<usize>>,
}

struct DeferredNode {
    ptr: *mut (),
    dealloc: unsafe fn(*mut ()),
}

// Safety: DeferredNode only carries the pointer and its deallocation function;
// access is serialized by the surrounding Mutex.
unsafe impl Send for DeferredNode {}

impl DeferredGuard {
    /// Create a new deferred guard.
    pub fn new() -> Self {
        DeferredGuard {
            deferred: Mutex::new(Vec::new()),
            #[cfg(debug_assertions)]
            seen: Mutex::new(HashSet::new()),
        }
    }

    /// Number of nodes waiting for destruction.
    pub fn pending(&self) -> usize {
        self.deferred.lock().len()
    }
}

impl Default for DeferredGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DeferredGuard {
    fn drop(&mut self) {
        for node in self.deferred.get_mut().drain(..) {
            unsafe {
                (node.dealloc)(node.ptr);
            }
        }
    }
}

impl Guard for DeferredGuard {
    /// No-op: retired nodes are protected until the stored guard drops.
    type ReadGuard = ();

    fn pin() -> Self::ReadGuard {}

    unsafe fn defer_destroy<N: 'static>(&self, node: *mut N, dealloc: unsafe fn(*mut N)) {
        #[cfg(debug_assertions)]
        {
            let addr = node as usize;
            if !self.seen.lock().insert(addr) {
                panic!("node {:#x} retired twice", addr);
            }
        }

        let node = DeferredNode {
            ptr: node as *mut (),
            dealloc: unsafe {
                std::mem::transmute::<unsafe fn(*mut N), unsafe fn(*mut ())>(dealloc)
            },
        };
        self.deferred.lock().push(node);
    }
}
