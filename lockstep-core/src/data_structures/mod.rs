//! Concurrent ordered sets over a sentinel-bounded, key-sorted chain.
//!
//! # Organization
//!
//! - [`sets`] - The four synchronization disciplines
//! - [`concurrent_set`] - The shared three-operation interface
//! - `internal` - Key derivation and the raw chain node (pub(crate))

pub(crate) mod internal;
pub mod sets;

pub mod concurrent_set;

pub use concurrent_set::ConcurrentSet;
pub use internal::{Key, KeyBuilder};
pub use sets::{CoarseSet, FineSet, LazySet, OptimisticSet};
