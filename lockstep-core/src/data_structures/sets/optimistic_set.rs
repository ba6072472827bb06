use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;
use std::ptr;

use rustc_hash::FxBuildHasher;

use crate::data_structures::internal::{ChainNode, NodePtr, Removal, Window, find_window};
use crate::data_structures::{ConcurrentSet, Key, KeyBuilder};
use crate::error::SetError;
use crate::guard::Guard;
use crate::retry::RetryPolicy;

/// Optimistic set: lock-free traversal, validated mutation.
///
/// Every operation walks the chain without locks, locks only the
/// predecessor/current pair it found, then validates that the predecessor is
/// still reachable from the head sentinel and still points at the current
/// node. A failed validation releases both locks and restarts from the head
/// according to the set's `RetryPolicy`.
///
/// ```text
/// 1. traverse unlocked     HEAD ──► 12 ──► 40 ──► TAIL        (key = 30)
/// 2. lock pair                     [12]──►[40]
/// 3. re-walk from HEAD     HEAD ──► 12 ?  and  12.next == 40 ?
/// 4. mutate or retry
/// ```
///
/// `contains` follows the same protocol so that its answer is linearizable.
///
/// Unlinked nodes may still be under another thread's unlocked cursor, so they
/// are handed to the guard `G` instead of being freed.
///
pub struct OptimisticSet<T, G: Guard, S = FxBuildHasher> {
    head: NodePtr<T>,
    keys: KeyBuilder<S>,
    policy: RetryPolicy,
    /// Shared guard instance for deferred destruction of unlinked nodes.
    guard: G,
    _marker: PhantomData<T>,
}

// Safety: every structural write happens under the two node locks, and
// unlinked nodes are reclaimed through `G`. Items may drop on any thread.
unsafe impl<T: Send, G: Guard, S: Send> Send for OptimisticSet<T, G, S> {}
unsafe impl<T: Send, G: Guard, S: Sync> Sync for OptimisticSet<T, G, S> {}

impl<T, G: Guard> OptimisticSet<T, G> {
    pub fn new() -> Self {
        Self::with_hasher_and_policy(FxBuildHasher, RetryPolicy::default())
    }

    pub fn with_policy(policy: RetryPolicy) -> Self {
        Self::with_hasher_and_policy(FxBuildHasher, policy)
    }
}

impl<T, G: Guard, S> OptimisticSet<T, G, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_hasher_and_policy(hasher, RetryPolicy::default())
    }

    pub fn with_hasher_and_policy(hasher: S, policy: RetryPolicy) -> Self {
        OptimisticSet {
            head: ChainNode::alloc_chain(),
            keys: KeyBuilder::new(hasher),
            policy,
            guard: G::default(),
            _marker: PhantomData,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Get the shared guard instance of this set.
    pub fn guard(&self) -> &G {
        &self.guard
    }

    /// Unlocked traversal. Caller keeps a read guard pinned.
    fn find(&self, key: Key) -> Window<'_, T> {
        unsafe { find_window(self.head, key) }
    }

    /// Check that `pred` is reachable from the head and still links to `curr`.
    ///
    /// Called with both nodes locked, so a successful validation stays true
    /// until the locks are released.
    fn validate(&self, pred: &ChainNode<T>, curr_ptr: NodePtr<T>) -> bool {
        let mut node = unsafe { ChainNode::from_ptr(self.head) };
        while node.key() <= pred.key() {
            if ptr::eq(node, pred) {
                return pred.get_next() == curr_ptr;
            }
            node = unsafe { ChainNode::from_ptr(node.get_next()) };
        }
        false
    }

    /// One attempt at linking `node`. `None` means validation failed.
    fn link_once(&self, node: NodePtr<T>, key: Key) -> Option<bool> {
        let Window {
            pred,
            curr,
            curr_ptr,
        } = self.find(key);
        let _pred_guard = pred.lock();
        let _curr_guard = curr.lock();

        if !self.validate(pred, curr_ptr) {
            return None;
        }
        if curr.key() == key {
            return Some(false);
        }

        // node is still private to this thread
        unsafe { ChainNode::from_ptr(node) }.set_next(curr_ptr);
        pred.set_next(node);
        Some(true)
    }

    fn unlink_once(&self, key: Key) -> Option<Removal<T>> {
        let Window {
            pred,
            curr,
            curr_ptr,
        } = self.find(key);
        let _pred_guard = pred.lock();
        let _curr_guard = curr.lock();

        if !self.validate(pred, curr_ptr) {
            return None;
        }
        if curr.key() != key {
            return Some(Removal::Missing);
        }

        pred.set_next(curr.get_next());
        Some(Removal::Unlinked(curr_ptr))
    }

    fn lookup_once(&self, key: Key) -> Option<bool> {
        let Window {
            pred,
            curr,
            curr_ptr,
        } = self.find(key);
        let _pred_guard = pred.lock();
        let _curr_guard = curr.lock();

        if !self.validate(pred, curr_ptr) {
            return None;
        }
        Some(curr.key() == key)
    }

    /// Finish an insertion attempt: a node that was not linked never became
    /// visible and is freed right away.
    fn settle_insert(node: NodePtr<T>, linked: bool) -> bool {
        if !linked {
            unsafe { ChainNode::dealloc_ptr(node) };
        }
        linked
    }

    fn settle_removal(&self, removal: Removal<T>) -> bool
    where
        T: 'static,
    {
        match removal {
            Removal::Unlinked(node) => {
                unsafe { self.guard.defer_destroy(node, ChainNode::dealloc_ptr) };
                true
            }
            Removal::Missing => false,
        }
    }
}

impl<T: Hash + 'static, G: Guard, S: BuildHasher> OptimisticSet<T, G, S> {
    /// `add` bounded by the policy's `max_attempts`.
    ///
    /// On error the set is unchanged and `item` is dropped.
    pub fn try_add(&self, item: T) -> Result<bool, SetError> {
        let _read = G::pin();
        let key = self.keys.key_of(&item);
        let node = ChainNode::alloc(item, key, ptr::null_mut());

        match self.policy.run_bounded("add", || self.link_once(node, key)) {
            Ok(linked) => Ok(Self::settle_insert(node, linked)),
            Err(err) => {
                Self::settle_insert(node, false);
                Err(err)
            }
        }
    }

    /// `remove` bounded by the policy's `max_attempts`.
    pub fn try_remove(&self, item: &T) -> Result<bool, SetError> {
        let _read = G::pin();
        let key = self.keys.key_of(item);
        let removal = self
            .policy
            .run_bounded("remove", || self.unlink_once(key))?;
        Ok(self.settle_removal(removal))
    }

    /// `contains` bounded by the policy's `max_attempts`.
    pub fn try_contains(&self, item: &T) -> Result<bool, SetError> {
        let _read = G::pin();
        let key = self.keys.key_of(item);
        self.policy
            .run_bounded("contains", || self.lookup_once(key))
    }
}

impl<T, G: Guard, S: Default> Default for OptimisticSet<T, G, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<T, G: Guard, S> Drop for OptimisticSet<T, G, S> {
    fn drop(&mut self) {
        // Unlinked nodes belong to the guard, which drops after this.
        unsafe { ChainNode::dealloc_chain(self.head) };
    }
}

impl<T, G, S> ConcurrentSet<T> for OptimisticSet<T, G, S>
where
    T: Hash + 'static,
    G: Guard,
    S: BuildHasher,
{
    fn add(&self, item: T) -> bool {
        let _read = G::pin();
        let key = self.keys.key_of(&item);
        let node = ChainNode::alloc(item, key, ptr::null_mut());
        let linked = self.policy.run("add", || self.link_once(node, key));
        Self::settle_insert(node, linked)
    }

    fn remove(&self, item: &T) -> bool {
        let _read = G::pin();
        let key = self.keys.key_of(item);
        let removal = self.policy.run("remove", || self.unlink_once(key));
        self.settle_removal(removal)
    }

    fn contains(&self, item: &T) -> bool {
        let _read = G::pin();
        let key = self.keys.key_of(item);
        self.policy.run("contains", || self.lookup_once(key))
    }

    fn scan_keys(&self) -> Vec<u64> {
        let _read = G::pin();
        let mut keys = Vec::new();
        let mut node = unsafe { ChainNode::from_ptr(self.head) };
        while !node.get_next().is_null() {
            node = unsafe { ChainNode::from_ptr(node.get_next()) };
            keys.extend(node.key().item_hash());
        }
        keys
    }
}
