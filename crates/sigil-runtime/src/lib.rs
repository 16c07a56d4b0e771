//! Sigil Runtime - orchestration layer for the Sigil bot framework.
//!
//! This crate provides:
//! - Layered configuration loading (`ConfigLoader`, `SigilConfig`)
//! - Logging configuration (`LoggingBuilder`)
//! - The runtime (`SigilRuntime`) that builds a router from configuration
//!   and feeds it inbound events until shutdown
//!
//! ```ignore
//! use sigil_runtime::{SigilRuntime, inbound_channel};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = SigilRuntime::new();
//!     let router = runtime.build_router(transport, |b| b.default_help(true))?;
//!
//!     let (tx, rx) = inbound_channel(256);
//!     spawn_transport(tx);
//!
//!     // Run until Ctrl+C
//!     runtime.run(&router, rx).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

// Re-exports
pub use config::{ConfigError, ConfigLoader, ConfigResult, SigilConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{InboundEvent, RuntimeBuilder, SigilRuntime, inbound_channel};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
