//! Configuration module for the Sigil runtime.
//!
//! This module provides figment-based configuration loading and validation
//! for the router, the interaction stores and logging.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    InteractionConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, RouterConfig,
    SigilConfig, SpanEventConfig,
};
pub use validation::validate_config;
