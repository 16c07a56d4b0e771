//! Error types for the Sigil framework.

use thiserror::Error;

/// Mistakes in the command tree or router setup, reported by
/// [`RouterBuilder::build`](crate::RouterBuilder::build).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A command name or alias is empty.
    #[error("command '{command}' has an empty name or alias")]
    EmptyToken {
        /// Path of the offending command (space-separated).
        command: String,
    },

    /// A command has no handler.
    #[error("command '{command}' has no handler")]
    MissingHandler {
        /// Path of the offending command (space-separated).
        command: String,
    },

    /// Two siblings can be invoked by the same token.
    #[error("'{token}' is claimed by both '{first}' and '{second}'")]
    DuplicateToken {
        /// The shared token.
        token: String,
        /// Path of the earlier sibling.
        first: String,
        /// Path of the later sibling.
        second: String,
    },

    /// No prefix was configured.
    #[error("at least one prefix is required")]
    NoPrefixes,

    /// The worker pool size is zero.
    #[error("worker pool needs at least one worker")]
    NoWorkers,

    /// The job queue capacity is zero.
    #[error("job queue capacity must be greater than 0")]
    ZeroCapacity,
}

/// Result type for registration.
pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// Returned when a job is submitted after the worker pool shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("worker pool is shut down")]
pub struct PoolClosed;
