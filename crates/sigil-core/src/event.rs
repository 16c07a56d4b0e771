//! Inbound event shapes.
//!
//! A transport converts whatever its platform delivers into one of these two
//! structs before handing it to the router.

use serde::{Deserialize, Serialize};

/// The author of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Stable user identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Whether the account is a bot account.
    #[serde(default)]
    pub bot: bool,
}

impl Author {
    /// Creates a human author.
    pub fn user(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            bot: false,
        }
    }

    /// Creates a bot author.
    pub fn bot(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            bot: true,
        }
    }
}

/// A "message created" event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Identifier of the message itself.
    pub id: String,
    /// Channel the message was posted in.
    pub channel_id: String,
    /// Guild / server the channel belongs to, if any.
    #[serde(default)]
    pub guild_id: Option<String>,
    /// Who wrote it.
    pub author: Author,
    /// Raw text content.
    pub content: String,
}

impl MessageEvent {
    /// Creates a message event without a guild.
    pub fn new(
        id: impl Into<String>,
        channel_id: impl Into<String>,
        author: Author,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            guild_id: None,
            author,
            content: content.into(),
        }
    }

    /// Sets the guild id.
    pub fn in_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    /// Returns `true` if the content is exactly a mention of `user_id`.
    ///
    /// Both the plain (`<@id>`) and the nickname (`<@!id>`) forms count.
    pub fn is_mention_of(&self, user_id: &str) -> bool {
        let content = self.content.as_str();
        content == mention_of(user_id) || content == format!("<@!{user_id}>")
    }
}

/// A "reaction added" event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionEvent {
    /// Channel of the reacted message.
    pub channel_id: String,
    /// The reacted message.
    pub message_id: String,
    /// The user who added the reaction.
    pub user_id: String,
    /// Emoji name (unicode emoji or custom emoji name).
    pub emoji: String,
}

impl ReactionEvent {
    /// Creates a reaction event.
    pub fn new(
        channel_id: impl Into<String>,
        message_id: impl Into<String>,
        user_id: impl Into<String>,
        emoji: impl Into<String>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            message_id: message_id.into(),
            user_id: user_id.into(),
            emoji: emoji.into(),
        }
    }
}

/// Formats a user mention in the platform's `<@id>` syntax.
pub fn mention_of(user_id: &str) -> String {
    format!("<@{user_id}>")
}
