use std::hash::{BuildHasher, Hash};

use parking_lot::Mutex;
use rustc_hash::FxBuildHasher;

use crate::data_structures::{ConcurrentSet, Key, KeyBuilder};

type Link<T> = Option<Box<CoarseNode<T>>>;

struct CoarseNode<T> {
    // Never read, owned so it drops with the node.
    #[allow(dead_code)]
    item: Option<T>,
    key: Key,
    next: Link<T>,
}

/// Sentinel-bounded chain owned through `Box` links.
struct Chain<T> {
    head: CoarseNode<T>,
}

impl<T> Chain<T> {
    fn new() -> Self {
        let tail = CoarseNode {
            item: None,
            key: Key::Tail,
            next: None,
        };
        Chain {
            head: CoarseNode {
                item: None,
                key: Key::Head,
                next: Some(Box::new(tail)),
            },
        }
    }

    /// Link whose node is the first with key >= `key`.
    ///
    /// Never returns an empty link: the tail sentinel stops every search.
    fn seek(&mut self, key: Key) -> &mut Link<T> {
        let mut link = &mut self.head.next;
        while link.as_ref().is_some_and(|node| node.key < key) {
            if let Some(node) = link {
                link = &mut node.next;
            }
        }
        link
    }

    fn keys(&self) -> Vec<u64> {
        let mut keys = Vec::new();
        let mut link = &self.head.next;
        while let Some(node) = link {
            keys.extend(node.key.item_hash());
            link = &node.next;
        }
        keys
    }
}

impl<T> Drop for Chain<T> {
    fn drop(&mut self) {
        // Unlink iteratively, recursive Box drops overflow on long chains.
        let mut link = self.head.next.take();
        while let Some(mut node) = link {
            link = node.next.take();
        }
    }
}

/// Coarse-grained set: a single lock held for the full duration of every
/// operation, reads included.
///
/// Trivially linearizable. Unlinked nodes are freed immediately since no
/// thread can observe the chain without the lock.
///
pub struct CoarseSet<T, S = FxBuildHasher> {
    chain: Mutex<Chain<T>>,
    keys: KeyBuilder<S>,
}

impl<T> CoarseSet<T> {
    pub fn new() -> Self {
        Self::with_hasher(FxBuildHasher)
    }
}

impl<T, S> CoarseSet<T, S> {
    pub fn with_hasher(hasher: S) -> Self {
        CoarseSet {
            chain: Mutex::new(Chain::new()),
            keys: KeyBuilder::new(hasher),
        }
    }
}

impl<T, S: Default> Default for CoarseSet<T, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<T, S> ConcurrentSet<T> for CoarseSet<T, S>
where
    T: Hash,
    S: BuildHasher,
{
    fn add(&self, item: T) -> bool {
        let key = self.keys.key_of(&item);
        let mut chain = self.chain.lock();
        let link = chain.seek(key);

        if link.as_ref().is_some_and(|node| node.key == key) {
            return false;
        }

        let next = link.take();
        *link = Some(Box::new(CoarseNode {
            item: Some(item),
            key,
            next,
        }));
        true
    }

    fn remove(&self, item: &T) -> bool {
        let key = self.keys.key_of(item);
        let mut chain = self.chain.lock();
        let link = chain.seek(key);

        if !link.as_ref().is_some_and(|node| node.key == key) {
            return false;
        }

        if let Some(mut node) = link.take() {
            *link = node.next.take();
        }
        true
    }

    fn contains(&self, item: &T) -> bool {
        let key = self.keys.key_of(item);
        let mut chain = self.chain.lock();
        chain.seek(key).as_ref().is_some_and(|node| node.key == key)
    }

    fn scan_keys(&self) -> Vec<u64> {
        self.chain.lock().keys()
    }
}
