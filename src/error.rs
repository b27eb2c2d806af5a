//! Error types for the countdown registry

use thiserror::Error;

/// Errors surfaced by registry operations.
///
/// Lookups of unknown timers are not errors: every operation treats a stale
/// id as a no-op and leaves state unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A timer was requested with a zero or negative duration
    #[error("Invalid duration: {0} seconds (must be positive)")]
    InvalidDuration(i64),

    /// The registry was torn down and accepts no new timers
    #[error("Registry is shut down")]
    Closed,

    /// The registry mutex was poisoned by a panicking holder
    #[error("Failed to lock registry")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, RegistryError>;
