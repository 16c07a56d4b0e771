//! Runtime orchestration: configuration, logging and the inbound event loop.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sigil_runtime::{SigilRuntime, inbound_channel};
//!
//! // Loads sigil.toml from the current directory, initializes logging.
//! let runtime = SigilRuntime::new();
//!
//! let router = runtime.build_router(transport, |b| {
//!     b.command(Command::new("ping").handler(ping))
//! })?;
//!
//! // The transport pushes InboundEvents into `tx`.
//! let (tx, rx) = inbound_channel(256);
//! runtime.run(&router, rx).await?;
//! ```

use std::future::Future;
use std::path::Path;

use sigil_core::{BoxedTransport, MessageEvent, ReactionEvent};
use sigil_framework::{Router, RouterBuilder};
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::config::{ConfigLoader, ConfigResult, SigilConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// An event delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A message was created.
    Message(MessageEvent),
    /// A reaction was added.
    Reaction(ReactionEvent),
}

impl From<MessageEvent> for InboundEvent {
    fn from(event: MessageEvent) -> Self {
        Self::Message(event)
    }
}

impl From<ReactionEvent> for InboundEvent {
    fn from(event: ReactionEvent) -> Self {
        Self::Reaction(event)
    }
}

/// Creates the channel a transport uses to hand events to the runtime.
pub fn inbound_channel(
    capacity: usize,
) -> (mpsc::Sender<InboundEvent>, mpsc::Receiver<InboundEvent>) {
    mpsc::channel(capacity)
}

/// Ties configuration, logging, a [`Router`] and an inbound event stream
/// together.
pub struct SigilRuntime {
    config: SigilConfig,
    shutdown: CancellationToken,
}

impl SigilRuntime {
    /// Creates a runtime from the configuration found in the current
    /// directory, falling back to defaults.
    pub fn new() -> Self {
        let config = ConfigLoader::new()
            .with_current_dir()
            .load()
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to load config ({e}), using defaults");
                SigilConfig::default()
            });

        Self::from_config(&config)
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from `config` and initializes logging.
    pub fn from_config(config: &SigilConfig) -> Self {
        logging::init_from_config(&config.logging);

        info!(
            log_level = %config.logging.level,
            prefixes = ?config.router.prefixes,
            workers = config.router.workers,
            "Runtime initialized from configuration"
        );

        Self {
            config: config.clone(),
            shutdown: CancellationToken::new(),
        }
    }

    /// The loaded configuration.
    pub fn config(&self) -> &SigilConfig {
        &self.config
    }

    /// A router builder preloaded with the configured settings and eviction
    /// policy.
    pub fn router_builder(&self) -> RouterBuilder {
        Router::builder()
            .with_settings(self.config.router.clone())
            .eviction(self.config.interaction.policy())
    }

    /// Builds a router from the configuration plus whatever `configure`
    /// registers.
    pub fn build_router(
        &self,
        transport: BoxedTransport,
        configure: impl FnOnce(RouterBuilder) -> RouterBuilder,
    ) -> RuntimeResult<Router> {
        Ok(configure(self.router_builder()).build(transport)?)
    }

    /// A token that stops [`run`](Self::run) when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Requests shutdown.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    /// Feeds `events` into `router` until Ctrl+C (or SIGTERM), the shutdown
    /// token, or the end of the event stream. Queued jobs are drained before
    /// returning.
    pub async fn run(
        &self,
        router: &Router,
        events: mpsc::Receiver<InboundEvent>,
    ) -> RuntimeResult<()> {
        info!("Sigil runtime is now running. Press Ctrl+C to stop.");
        self.serve(router, events, wait_for_signal()).await
    }

    /// Like [`run`](Self::run), with `shutdown` in place of the OS signals.
    pub async fn run_until<F>(
        &self,
        router: &Router,
        events: mpsc::Receiver<InboundEvent>,
        shutdown: F,
    ) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        self.serve(router, events, async {
            shutdown.await;
            Ok(())
        })
        .await
    }

    async fn serve<F>(
        &self,
        router: &Router,
        mut events: mpsc::Receiver<InboundEvent>,
        shutdown: F,
    ) -> RuntimeResult<()>
    where
        F: Future<Output = RuntimeResult<()>>,
    {
        let mut shutdown = std::pin::pin!(shutdown);
        let token = self.shutdown.clone();

        let result = loop {
            tokio::select! {
                result = &mut shutdown => break result,
                () = token.cancelled() => {
                    info!("Shutdown requested");
                    break Ok(());
                }
                event = events.recv() => match event {
                    Some(event) => dispatch(router, event).await,
                    None => {
                        info!("Inbound event stream closed");
                        break Ok(());
                    }
                },
            }
        };

        info!("Stopping Sigil runtime, draining queued jobs");
        router.shutdown().await;
        self.shutdown.cancel();
        info!("Runtime stopped");

        result
    }
}

impl Default for SigilRuntime {
    fn default() -> Self {
        Self::new()
    }
}

async fn dispatch(router: &Router, event: InboundEvent) {
    match event {
        InboundEvent::Message(message) => {
            let id = message.id.clone();
            let outcome = router.handle_message(message).await;
            trace!(message = %id, ?outcome, "Message handled");
        }
        InboundEvent::Reaction(reaction) => {
            debug!(message = %reaction.message_id, emoji = %reaction.emoji, "Reaction received");
            router.handle_reaction(&reaction).await;
        }
    }
}

/// Waits for Ctrl+C or, on unix, SIGTERM.
async fn wait_for_signal() -> RuntimeResult<()> {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .map_err(RuntimeError::Signal)?;

        tokio::select! {
            result = signal::ctrl_c() => {
                result.map_err(RuntimeError::Signal)?;
                info!("Received Ctrl+C, shutting down");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await.map_err(RuntimeError::Signal)?;
        info!("Received Ctrl+C, shutting down");
    }

    Ok(())
}

/// Builder for a [`SigilRuntime`] with custom configuration sources.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Searches the current directory, reads `SIGIL_*` variables.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    /// Loads this file instead of searching.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g. "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Also searches the user configuration directory.
    pub fn with_user_config_dir(mut self) -> Self {
        self.config_loader = self.config_loader.with_user_config_dir();
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: SigilConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Loads the configuration and builds the runtime.
    pub fn build(self) -> ConfigResult<SigilRuntime> {
        let config = self.config_loader.load()?;
        Ok(SigilRuntime::from_config(&config))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
