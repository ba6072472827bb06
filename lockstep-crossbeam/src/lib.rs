//! Epoch-based reclamation for the lockstep sets.
//!
//! `OptimisticSet` and `LazySet` traverse the chain without locks, so unlinked
//! nodes must outlive every traversal that might still reach them. This crate
//! provides `EpochGuard`, a `Guard` backed by crossbeam-epoch.
//!
//! # Usage
//!
//! ```
//! use lockstep_core::{ConcurrentSet, LazySet};
//! use lockstep_crossbeam::EpochGuard;
//!
//! let set: LazySet<i32, EpochGuard> = LazySet::new();
//! assert!(set.add(42));
//! assert!(set.contains(&42));
//! assert!(set.remove(&42));
//! ```

pub mod epoch_guard;

pub use epoch_guard::EpochGuard;
