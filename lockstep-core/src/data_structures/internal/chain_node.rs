use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};

use parking_lot::{Mutex, MutexGuard};

use super::key::Key;

pub(crate) type NodePtr<T> = *mut ChainNode<T>;

// Node shared by the fine-grained, optimistic and lazy sets.
//
// ┌──────┐    ┌──────┐    ┌──────┐    ┌──────┐
// │ HEAD │───►│ k=12 │───►│ k=40 │───►│ TAIL │───► null
// │(sent)│    │      │    │      │    │(sent)│
// └──────┘    └──────┘    └──────┘    └──────┘
//
// INVARIANTS (between operations):
// 1. Keys strictly increase from HEAD to TAIL among unmarked nodes
// 2. HEAD and TAIL are never unlinked, TAIL is the only node with a null next
// 3. `next` is only written while holding `lock` of the node being written
// 4. `marked` is only set by the lazy set, before the node is unlinked
//
pub(crate) struct ChainNode<T> {
    // Never read, owned so it drops with the node.
    #[allow(dead_code)]
    item: Option<T>,
    key: Key,
    next: AtomicPtr<ChainNode<T>>,
    lock: Mutex<()>,
    marked: AtomicBool,
}

impl<T> ChainNode<T> {
    pub(crate) fn alloc(item: T, key: Key, next: NodePtr<T>) -> NodePtr<T> {
        Box::into_raw(Box::new(ChainNode {
            item: Some(item),
            key,
            next: AtomicPtr::new(next),
            lock: Mutex::new(()),
            marked: AtomicBool::new(false),
        }))
    }

    fn alloc_sentinel(key: Key, next: NodePtr<T>) -> NodePtr<T> {
        debug_assert!(key.is_sentinel());
        Box::into_raw(Box::new(ChainNode {
            item: None,
            key,
            next: AtomicPtr::new(next),
            lock: Mutex::new(()),
            marked: AtomicBool::new(false),
        }))
    }

    /// Allocate an empty chain and return its head sentinel.
    pub(crate) fn alloc_chain() -> NodePtr<T> {
        let tail = Self::alloc_sentinel(Key::Tail, ptr::null_mut());
        Self::alloc_sentinel(Key::Head, tail)
    }

    /// Borrow a node from a raw pointer.
    ///
    /// # Safety
    /// `ptr` must be non-null and the node must stay allocated for `'a`.
    #[inline]
    pub(crate) unsafe fn from_ptr<'a>(ptr: NodePtr<T>) -> &'a ChainNode<T> {
        unsafe { &*ptr }
    }

    /// Deallocate a node.
    ///
    /// # Safety
    /// `ptr` must come from `alloc`/`alloc_chain`, must be freed only once and
    /// must not be accessed afterwards.
    pub(crate) unsafe fn dealloc_ptr(ptr: NodePtr<T>) {
        unsafe { drop(Box::from_raw(ptr)) };
    }

    /// Free every node reachable from `head`, `head` included.
    ///
    /// # Safety
    /// Caller must have exclusive access to the chain.
    pub(crate) unsafe fn dealloc_chain(head: NodePtr<T>) {
        let mut curr = head;
        while !curr.is_null() {
            let next = unsafe { (*curr).get_next() };
            unsafe { Self::dealloc_ptr(curr) };
            curr = next;
        }
    }

    #[inline]
    pub(crate) fn key(&self) -> Key {
        self.key
    }

    #[inline]
    pub(crate) fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock()
    }

    #[cfg(test)]
    pub(crate) fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    // =========================================================================
    // Next pointer accessors
    // =========================================================================

    /// Load next pointer (Acquire ordering)
    #[inline]
    pub(crate) fn get_next(&self) -> NodePtr<T> {
        self.next.load(Ordering::Acquire)
    }

    /// Store next pointer (Release ordering). Caller holds `lock`.
    #[inline]
    pub(crate) fn set_next(&self, ptr: NodePtr<T>) {
        self.next.store(ptr, Ordering::Release)
    }

    // =========================================================================
    // Logical removal
    // =========================================================================

    #[inline]
    pub(crate) fn is_marked(&self) -> bool {
        self.marked.load(Ordering::Acquire)
    }

    /// Mark the node logically removed. Caller holds `lock`.
    #[inline]
    pub(crate) fn mark(&self) {
        self.marked.store(true, Ordering::Release)
    }
}

/// A predecessor/current pair bracketing a key.
///
/// `curr` is the first node whose key is not below the target, `pred` the
/// node right before it at the time it was read.
pub(crate) struct Window<'a, T> {
    pub(crate) pred: &'a ChainNode<T>,
    pub(crate) curr: &'a ChainNode<T>,
    pub(crate) curr_ptr: NodePtr<T>,
}

/// Outcome of a validated removal attempt.
pub(crate) enum Removal<T> {
    /// Unlinked, waiting to be retired.
    Unlinked(NodePtr<T>),
    Missing,
}

/// Walk from `head` without locks until the first node with key >= `key`.
///
/// # Safety
/// `head` must be the head sentinel of a live chain, and every node reached
/// must stay allocated for `'a` (the caller keeps a read guard pinned).
pub(crate) unsafe fn find_window<'a, T>(head: NodePtr<T>, key: Key) -> Window<'a, T> {
    let mut pred = unsafe { ChainNode::from_ptr(head) };
    let mut curr_ptr = pred.get_next();
    let mut curr = unsafe { ChainNode::from_ptr(curr_ptr) };

    while curr.key() < key {
        pred = curr;
        curr_ptr = curr.get_next();
        curr = unsafe { ChainNode::from_ptr(curr_ptr) };
    }

    Window {
        pred,
        curr,
        curr_ptr,
    }
}
