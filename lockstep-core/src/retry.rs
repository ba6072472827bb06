//! Retry configuration for the validating sets.
//!
//! The optimistic and lazy sets restart from the head sentinel whenever
//! validation fails. `RetryPolicy` decides how long a thread waits between
//! attempts and, for the `try_*` operations, how many attempts it makes.
//!
//! Retrying is unbounded for `add`/`remove`/`contains`. Under sustained
//! contention on the same window a thread can keep losing validation, so
//! neither variant guarantees per-thread progress.

use std::num::NonZeroU32;

use crate::error::SetError;

/// Wait strategy between two validation attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backoff {
    /// Restart right away.
    #[default]
    Immediate,
    /// Exponential busy-wait, capped by `crossbeam_utils::Backoff`.
    Spin,
    /// Busy-wait first, then yield the thread to the scheduler.
    Snooze,
}

/// Retry behavior bound once per set instance.
///
/// ```rust
/// use std::num::NonZeroU32;
/// use lockstep_core::{Backoff, RetryPolicy};
///
/// let policy = RetryPolicy::default()
///     .with_backoff(Backoff::Snooze)
///     .with_max_attempts(NonZeroU32::new(64).unwrap());
/// assert_eq!(policy.max_attempts().map(NonZeroU32::get), Some(64));
/// ```
///
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    backoff: Backoff,
    max_attempts: Option<NonZeroU32>,
}

impl RetryPolicy {
    /// Retry forever without waiting.
    pub const fn unbounded() -> Self {
        RetryPolicy {
            backoff: Backoff::Immediate,
            max_attempts: None,
        }
    }

    pub const fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Limit the number of attempts made by the `try_*` operations.
    pub const fn with_max_attempts(mut self, max_attempts: NonZeroU32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub const fn backoff(&self) -> Backoff {
        self.backoff
    }

    pub const fn max_attempts(&self) -> Option<NonZeroU32> {
        self.max_attempts
    }

    /// Run `attempt` until it produces a result, ignoring `max_attempts`.
    ///
    /// `attempt` returns `None` when validation failed and the operation must
    /// restart from the head sentinel.
    ///
    pub(crate) fn run<R>(
        &self,
        operation: &'static str,
        mut attempt: impl FnMut() -> Option<R>,
    ) -> R {
        let mut waiter = Waiter::new(self.backoff);
        let mut attempts: u32 = 0;
        loop {
            if let Some(result) = attempt() {
                return result;
            }
            attempts = attempts.saturating_add(1);
            tracing::trace!(operation, attempts, "validation failed, restarting from head");
            waiter.wait();
        }
    }

    /// Run `attempt` until it produces a result or the attempt budget is spent.
    pub(crate) fn run_bounded<R>(
        &self,
        operation: &'static str,
        mut attempt: impl FnMut() -> Option<R>,
    ) -> Result<R, SetError> {
        let limit = self.max_attempts.map_or(u32::MAX, NonZeroU32::get);
        let mut waiter = Waiter::new(self.backoff);
        let mut attempts: u32 = 0;
        loop {
            if let Some(result) = attempt() {
                return Ok(result);
            }
            attempts = attempts.saturating_add(1);
            if attempts >= limit {
                tracing::debug!(operation, attempts, "retry limit reached");
                return Err(SetError::RetryLimitExceeded {
                    operation,
                    attempts,
                });
            }
            tracing::trace!(operation, attempts, "validation failed, restarting from head");
            waiter.wait();
        }
    }
}

struct Waiter {
    strategy: Backoff,
    backoff: crossbeam_utils::Backoff,
}

impl Waiter {
    fn new(strategy: Backoff) -> Self {
        Waiter {
            strategy,
            backoff: crossbeam_utils::Backoff::new(),
        }
    }

    fn wait(&mut self) {
        match self.strategy {
            Backoff::Immediate => {}
            Backoff::Spin => self.backoff.spin(),
            Backoff::Snooze => self.backoff.snooze(),
        }
    }
}
