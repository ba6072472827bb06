/// A concurrent set over a key-sorted chain of nodes.
///
/// All four synchronization disciplines expose the same three operations and
/// the same observable semantics. Membership is decided by the derived key
/// alone: two elements hashing to the same key occupy a single slot.
///
/// ```text
/// ConcurrentSet<T>
///     │
///     ├── CoarseSet<T>          one lock for the whole chain
///     ├── FineSet<T>            hand-over-hand node locks
///     ├── OptimisticSet<T, G>   unlocked traversal, validate by re-walk
///     └── LazySet<T, G>         unlocked traversal, logical removal mark
/// ```
///
pub trait ConcurrentSet<T> {
    /// Add an element.
    ///
    /// Returns `true` if no live node held the element's key and a new node
    /// was linked in, `false` if the key was already present.
    ///
    fn add(&self, item: T) -> bool;

    /// Remove an element.
    ///
    /// Returns `true` if a live node with the element's key existed and was
    /// removed.
    ///
    fn remove(&self, item: &T) -> bool;

    /// Check whether a live node with the element's key exists.
    fn contains(&self, item: &T) -> bool;

    /// Derived keys of the live nodes, in chain order.
    ///
    /// Test-only diagnostic for checking ordering invariants, not an
    /// iteration API. Walks the whole chain and is only meaningful while no
    /// other thread mutates the set.
    ///
    #[doc(hidden)]
    fn scan_keys(&self) -> Vec<u64>;
}
