//! # Sigil Core
//!
//! The platform-facing vocabulary shared by every Sigil crate.
//!
//! Sigil never talks to a messaging platform directly. Instead, the
//! application plugs in a [`Transport`] implementation that delivers inbound
//! events and performs the handful of outbound calls the dispatcher needs.
//!
//! This crate defines:
//! - **Events**: [`MessageEvent`] and [`ReactionEvent`], the two inbound shapes
//! - **Embeds**: [`Embed`] and [`EmbedField`], the structured message model
//! - **Transport**: the [`Transport`] trait and [`BoxedTransport`] alias
//! - **Errors**: [`TransportError`] and [`TransportResult`]
//!
//! ```text
//! ┌──────────────┐  MessageEvent   ┌──────────┐   Job    ┌─────────────┐
//! │  Transport   │────────────────▶│  Router  │─────────▶│ Worker Pool │
//! │  (platform)  │◀────────────────│          │          │  (handlers) │
//! └──────────────┘  send / edit    └──────────┘          └─────────────┘
//! ```

pub mod embed;
pub mod error;
pub mod event;
pub mod transport;

pub use embed::{Embed, EmbedField};
pub use error::{TransportError, TransportResult};
pub use event::{Author, MessageEvent, ReactionEvent, mention_of};
pub use transport::{BoxedTransport, Transport};
