use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;
use std::ptr;

use rustc_hash::FxBuildHasher;

use crate::data_structures::internal::{ChainNode, NodePtr, Removal, Window, find_window};
use crate::data_structures::{ConcurrentSet, Key, KeyBuilder};
use crate::error::SetError;
use crate::guard::Guard;
use crate::retry::RetryPolicy;

/// Lazy set: optimistic traversal with logical-then-physical deletion.
///
/// Removal happens in two steps, both under the locks of the predecessor and
/// the victim:
///
/// ```text
/// Phase 1: LOGICAL DELETE  (mark curr, contains stops seeing it)
///          pred ──────► curr(marked) ──────► next
///
/// Phase 2: PHYSICAL UNLINK (pred.next = curr.next)
///          pred ───────────────────────────► next
///                       curr(marked) ──────► next   (retired to G)
/// ```
///
/// Because a reachable node is unmarked, validation is local: neither node
/// of the window is marked and `pred.next` still points at `curr`. There is
/// no re-walk from the head.
///
/// A marked node found by `add`/`remove` fails validation, so such an
/// operation retries until the node is gone and positions itself as if the
/// node were absent. `contains` never locks and never retries.
///
pub struct LazySet<T, G: Guard, S = FxBuildHasher> {
    head: NodePtr<T>,
    keys: KeyBuilder<S>,
    policy: RetryPolicy,
    /// Shared guard instance for deferred destruction of unlinked nodes.
    guard: G,
    _marker: PhantomData<T>,
}

// Safety: every structural write happens under the two node locks, and
// unlinked nodes are reclaimed through `G`. Items may drop on any thread.
unsafe impl<T: Send, G: Guard, S: Send> Send for LazySet<T, G, S> {}
unsafe impl<T: Send, G: Guard, S: Sync> Sync for LazySet<T, G, S> {}

impl<T, G: Guard> LazySet<T, G> {
    pub fn new() -> Self {
        Self::with_hasher_and_policy(FxBuildHasher, RetryPolicy::default())
    }

    pub fn with_policy(policy: RetryPolicy) -> Self {
        Self::with_hasher_and_policy(FxBuildHasher, policy)
    }
}

impl<T, G: Guard, S> LazySet<T, G, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_hasher_and_policy(hasher, RetryPolicy::default())
    }

    pub fn with_hasher_and_policy(hasher: S, policy: RetryPolicy) -> Self {
        LazySet {
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

    fn find(&self, key: Key) -> Window<'_, T> {
        unsafe { find_window(self.head, key) }
    }

    /// Both nodes unmarked and still adjacent. Caller holds both locks.
    fn validate(pred: &ChainNode<T>, curr: &ChainNode<T>, curr_ptr: NodePtr<T>) -> bool {
        !pred.is_marked() && !curr.is_marked() && pred.get_next() == curr_ptr
    }

    fn link_once(&self, node: NodePtr<T>, key: Key) -> Option<bool> {
        let Window {
            pred,
            curr,
            curr_ptr,
        } = self.find(key);
        let _pred_guard = pred.lock();
        let _curr_guard = curr.lock();

        if !Self::validate(pred, curr, curr_ptr) {
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

        if !Self::validate(pred, curr, curr_ptr) {
            return None;
        }
        if curr.key() != key {
            return Some(Removal::Missing);
        }

        curr.mark();
        pred.set_next(curr.get_next());
        Some(Removal::Unlinked(curr_ptr))
    }

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

impl<T: Hash + 'static, G: Guard, S: BuildHasher> LazySet<T, G, S> {
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
}

impl<T, G: Guard, S: Default> Default for LazySet<T, G, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<T, G: Guard, S> Drop for LazySet<T, G, S> {
    fn drop(&mut self) {
        // Unlinked nodes belong to the guard, which drops after this.
        unsafe { ChainNode::dealloc_chain(self.head) };
    }
}

impl<T, G, S> ConcurrentSet<T> for LazySet<T, G, S>
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

    /// Wait-free: a single unlocked walk, no validation.
    fn contains(&self, item: &T) -> bool {
        let _read = G::pin();
        let key = self.keys.key_of(item);
        let mut curr = unsafe { ChainNode::from_ptr(self.head) };
        while curr.key() < key {
            curr = unsafe { ChainNode::from_ptr(curr.get_next()) };
        }
        curr.key() == key && !curr.is_marked()
    }

    fn scan_keys(&self) -> Vec<u64> {
        let _read = G::pin();
        let mut keys = Vec::new();
        let mut node = unsafe { ChainNode::from_ptr(self.head) };
        while !node.get_next().is_null() {
            node = unsafe { ChainNode::from_ptr(node.get_next()) };
            if !node.is_marked() {
                keys.extend(node.key().item_hash());
            }
        }
        keys
    }
}
