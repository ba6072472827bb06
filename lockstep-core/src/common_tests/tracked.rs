//! Drop-counting element for ownership checks.

use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Element that bumps a shared counter when dropped.
///
/// Hashes by `value` only, so a lookup copy with its own
/// counter finds the stored one.
///
#[derive(Debug)]
pub struct Tracked {
    value: u64,
    drops: Arc<AtomicUsize>,
}

impl Tracked {
    pub fn new(value: u64, drops: &Arc<AtomicUsize>) -> Self {
        Tracked {
            value,
            drops: Arc::clone(drops),
        }
    }
}

impl Hash for Tracked {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}
