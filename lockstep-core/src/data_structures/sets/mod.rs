//! Set implementations, one per synchronization discipline.
//!
//! The optimistic and lazy sets traverse without locks and are parameterized
//! by a guard type `G: Guard` that determines how unlinked nodes are
//! reclaimed:
//!
//! - `DeferredGuard`: Testing - defers destruction until the set drops
//! - `EpochGuard`: Production - epoch-based reclamation (lockstep-crossbeam)

pub mod coarse_set;
pub mod fine_set;
pub mod lazy_set;
pub mod optimistic_set;

pub use coarse_set::CoarseSet;
pub use fine_set::FineSet;
pub use lazy_set::LazySet;
pub use optimistic_set::OptimisticSet;
