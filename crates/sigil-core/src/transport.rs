//! The transport trait.
//!
//! A [`Transport`] is the application's connection to a messaging platform,
//! seen from the dispatcher's side: a stable bot identity plus the outbound
//! calls used by handlers and by the built-in help pagination.

use std::sync::Arc;

use async_trait::async_trait;

use crate::embed::Embed;
use crate::error::TransportResult;

/// Outbound half of a messaging platform client.
///
/// Every call reports failure through [`TransportResult`]; the dispatcher
/// propagates these to the calling handler untouched.
///
/// # Example Implementation
///
/// ```rust,ignore
/// struct NullTransport;
///
/// #[async_trait]
/// impl Transport for NullTransport {
///     fn self_id(&self) -> &str { "0" }
///     async fn send_text(&self, _: &str, _: &str) -> TransportResult<String> {
///         Ok("1".into())
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Returns the bot's own user identifier.
    fn self_id(&self) -> &str;

    /// Sends a plain text message. Returns the new message id.
    async fn send_text(&self, channel_id: &str, content: &str) -> TransportResult<String>;

    /// Sends an embed. Returns the new message id.
    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> TransportResult<String>;

    /// Sends text and an embed in one message. Returns the new message id.
    async fn send_text_embed(
        &self,
        channel_id: &str,
        content: &str,
        embed: &Embed,
    ) -> TransportResult<String>;

    /// Replaces the embed of an existing message.
    async fn edit_embed(
        &self,
        channel_id: &str,
        message_id: &str,
        embed: &Embed,
    ) -> TransportResult<()>;

    /// Deletes a message.
    async fn delete_message(&self, channel_id: &str, message_id: &str) -> TransportResult<()>;

    /// Adds a reaction as the bot.
    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> TransportResult<()>;

    /// Removes `user_id`'s reaction from a message.
    async fn remove_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
        user_id: &str,
    ) -> TransportResult<()>;
}

/// A shared transport trait object.
pub type BoxedTransport = Arc<dyn Transport>;
