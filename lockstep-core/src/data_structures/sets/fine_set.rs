use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;

use parking_lot::MutexGuard;
use rustc_hash::FxBuildHasher;

use crate::data_structures::internal::{ChainNode, NodePtr};
use crate::data_structures::{ConcurrentSet, Key, KeyBuilder};

/// Fine-grained set: one lock per node, hand-over-hand traversal.
///
/// A thread always holds the lock of the node whose `next` it reads, and
/// locks the successor before letting go of that node:
///
/// ```text
///   step 1      [HEAD]──►[ 12 ]──► 40 ──► TAIL
///   step 2       HEAD ──►[ 12 ]──►[ 40 ]──► TAIL
///                         pred     curr
/// ```
///
/// Operations on disjoint regions of the chain proceed concurrently, but
/// every operation pays one lock hand-off per node walked. There are no
/// retries. A node is reachable only through its locked predecessor, so an
/// unlinked node is freed right away.
///
pub struct FineSet<T, S = FxBuildHasher> {
    head: NodePtr<T>,
    keys: KeyBuilder<S>,
    _marker: PhantomData<T>,
}

// Safety: nodes are only reached through hand-over-hand locking; items move
// into the set on `add` and may be dropped by whichever thread removes them.
unsafe impl<T: Send, S: Send> Send for FineSet<T, S> {}
unsafe impl<T: Send, S: Sync> Sync for FineSet<T, S> {}

/// Both nodes of a window, locked.
struct LockedWindow<'a, T> {
    pred: &'a ChainNode<T>,
    curr: &'a ChainNode<T>,
    curr_ptr: NodePtr<T>,
    pred_guard: MutexGuard<'a, ()>,
    curr_guard: MutexGuard<'a, ()>,
}

impl<T> FineSet<T> {
    pub fn new() -> Self {
        Self::with_hasher(FxBuildHasher)
    }
}

impl<T, S> FineSet<T, S> {
    pub fn with_hasher(hasher: S) -> Self {
        FineSet {
            head: ChainNode::alloc_chain(),
            keys: KeyBuilder::new(hasher),
            _marker: PhantomData,
        }
    }

    /// Hand-over-hand walk to the first node with key >= `key`.
    fn lock_window(&self, key: Key) -> LockedWindow<'_, T> {
        let mut pred = unsafe { ChainNode::from_ptr(self.head) };
        let mut pred_guard = pred.lock();
        let mut curr_ptr = pred.get_next();
        let mut curr = unsafe { ChainNode::from_ptr(curr_ptr) };
        let mut curr_guard = curr.lock();

        while curr.key() < key {
            // Releases the old predecessor, curr stays locked.
            pred_guard = curr_guard;
            pred = curr;
            curr_ptr = pred.get_next();
            curr = unsafe { ChainNode::from_ptr(curr_ptr) };
            curr_guard = curr.lock();
        }

        LockedWindow {
            pred,
            curr,
            curr_ptr,
            pred_guard,
            curr_guard,
        }
    }
}

impl<T, S: Default> Default for FineSet<T, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<T, S> Drop for FineSet<T, S> {
    fn drop(&mut self) {
        unsafe { ChainNode::dealloc_chain(self.head) };
    }
}

impl<T, S> ConcurrentSet<T> for FineSet<T, S>
where
    T: Hash,
    S: BuildHasher,
{
    fn add(&self, item: T) -> bool {
        let key = self.keys.key_of(&item);
        let window = self.lock_window(key);

        if window.curr.key() == key {
            return false;
        }

        let node = ChainNode::alloc(item, key, window.curr_ptr);
        window.pred.set_next(node);
        true
    }

    fn remove(&self, item: &T) -> bool {
        let key = self.keys.key_of(item);
        let LockedWindow {
            pred,
            curr,
            curr_ptr,
            pred_guard,
            curr_guard,
        } = self.lock_window(key);

        if curr.key() != key {
            return false;
        }

        pred.set_next(curr.get_next());

        // Nobody else can hold or wait for curr's lock: reaching curr requires
        // pred's lock, which is still ours until the node is gone.
        drop(curr_guard);
        unsafe { ChainNode::dealloc_ptr(curr_ptr) };
        drop(pred_guard);
        true
    }

    fn contains(&self, item: &T) -> bool {
        let key = self.keys.key_of(item);
        self.lock_window(key).curr.key() == key
    }

    fn scan_keys(&self) -> Vec<u64> {
        let mut keys = Vec::new();
        let mut node = unsafe { ChainNode::from_ptr(self.head) };
        let mut guard = node.lock();

        loop {
            let next_ptr = node.get_next();
            if next_ptr.is_null() {
                break;
            }
            let next = unsafe { ChainNode::from_ptr(next_ptr) };
            let next_guard = next.lock();
            keys.extend(next.key().item_hash());
            guard = next_guard;
            node = next;
        }

        drop(guard);
        keys
    }
}
