//! # Sigil
//!
//! Command resolution and concurrent dispatch for chat bots.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐  InboundEvent  ┌──────────┐   Job   ┌───────────────────┐
//! │  Transport  │───────────────▶│  Router  │────────▶│ Worker 1..N       │
//! │ (platform)  │                │          │         │ (command handlers)│
//! └─────────────┘◀───────────────└──────────┘         └───────────────────┘
//!                 send / edit / react
//! ```
//!
//! - **Transport**: the application's platform client, behind the `Transport` trait
//! - **Router**: prefixes, ping shortcut, middleware, longest-match lookup
//! - **Commands**: an immutable tree with aliases and recursive sub-commands
//! - **Worker pool**: a bounded queue drained by a fixed number of workers
//! - **Interaction stores**: typed state for multi-step flows such as help pages
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sigil::prelude::*;
//!
//! async fn ping(ctx: CommandContext) {
//!     let _ = ctx.respond_text("Pong!").await;
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = SigilRuntime::new();
//!     let router = runtime.build_router(transport, |b| {
//!         b.default_help(true)
//!             .command(Command::new("ping").description("Checks the bot").handler(ping))
//!     })?;
//!
//!     let (tx, rx) = inbound_channel(256);
//!     // hand `tx` to the transport...
//!     runtime.run(&router, rx).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` (default): `sigil.toml` configuration files
//! - `yaml-config`: `sigil.yaml` configuration files
//! - `json-log`: JSON log output

pub use sigil_core as core;
pub use sigil_framework as framework;
pub use sigil_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use sigil::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use sigil_runtime::{InboundEvent, SigilConfig, SigilRuntime, inbound_channel};

    // Commands and dispatch
    pub use sigil_framework::{
        Argument, Arguments, Command, CommandBuilder, CommandContext, DispatchOutcome,
        EvictionPolicy, InteractionStore, Router, RouterBuilder, interaction_key,
    };

    // Platform model - for implementing transports
    pub use sigil_core::{
        Author, BoxedTransport, Embed, MessageEvent, ReactionEvent, Transport, TransportError,
        TransportResult,
    };
}
