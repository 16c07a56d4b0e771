//! Runtime error types.

use thiserror::Error;

pub use crate::config::{ConfigError, ConfigResult};

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Loading or validating the configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The router rejected its commands or settings.
    #[error("Router registration failed: {0}")]
    Registration(#[from] sigil_framework::RegistrationError),

    /// Installing a signal handler failed.
    #[error("Failed to listen for shutdown signals: {0}")]
    Signal(#[source] std::io::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
