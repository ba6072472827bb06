use thiserror::Error;

/// Errors surfaced by the bounded `try_*` operations.
///
/// The plain `add`/`remove`/`contains` operations never fail; duplicate and
/// missing keys are reported through their boolean result.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SetError {
    #[error("{operation} gave up after {attempts} failed validation attempts")]
    RetryLimitExceeded {
        operation: &'static str,
        attempts: u32,
    },
}
