pub mod common_tests;
pub mod data_structures;
pub mod error;
pub mod guard;
pub mod retry;

pub use data_structures::{
    CoarseSet, ConcurrentSet, FineSet, Key, KeyBuilder, LazySet, OptimisticSet,
};
pub use error::SetError;
pub use guard::{DeferredGuard, Guard};
pub use retry::{Backoff, RetryPolicy};
