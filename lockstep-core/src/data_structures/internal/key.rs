use std::hash::{BuildHasher, Hash};

use rustc_hash::FxBuildHasher;

/// Ordering key of a chain node.
///
/// The derived ordering puts `Head` below every item key and `Tail` above
/// every item key, so the sentinels bound the chain and no element can ever
/// produce a key equal to a sentinel's.
///
/// ```text
/// Head < Item(0) < Item(1) < ... < Item(u64::MAX) < Tail
/// ```
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Head,
    Item(u64),
    Tail,
}

impl Key {
    /// Hash value of an item key, `None` for sentinels.
    pub fn item_hash(self) -> Option<u64> {
        match self {
            Key::Item(hash) => Some(hash),
            Key::Head | Key::Tail => None,
        }
    }

    pub fn is_sentinel(self) -> bool {
        self.item_hash().is_none()
    }
}

/// Derives ordering keys from elements.
///
/// Bound once per set instance. Two elements with the same hash share a key
/// and therefore a single slot in the set: membership is decided by key
/// equality alone.
///
#[derive(Debug, Clone, Default)]
pub struct KeyBuilder<S = FxBuildHasher> {
    hasher: S,
}

impl<S> KeyBuilder<S> {
    pub fn new(hasher: S) -> Self {
        KeyBuilder { hasher }
    }
}

impl<S: BuildHasher> KeyBuilder<S> {
    #[inline]
    pub fn key_of<T: Hash + ?Sized>(&self, item: &T) -> Key {
        Key::Item(self.hasher.hash_one(item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_bound_item_keys() {
        assert!(Key::Head < Key::Item(0));
        assert!(Key::Item(u64::MAX) < Key::Tail);
        assert!(Key::Item(3) < Key::Item(4));
        assert!(Key::Head.is_sentinel());
        assert!(Key::Tail.is_sentinel());
        assert_eq!(Key::Item(9).item_hash(), Some(9));
    }

    #[test]
    fn test_key_builder_is_deterministic() {
        let keys = KeyBuilder::<FxBuildHasher>::default();
        assert_eq!(keys.key_of(&17), keys.key_of(&17));
        assert_ne!(keys.key_of(&17), keys.key_of(&18));
        assert!(!keys.key_of("chain").is_sentinel());
    }
}
