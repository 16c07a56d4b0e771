//! Test helpers: a recording transport and router/context shortcuts.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use sigil_core::{Author, BoxedTransport, Embed, MessageEvent, Transport, TransportResult};

use crate::args::Arguments;
use crate::command::Command;
use crate::context::CommandContext;
use crate::router::{Router, RouterBuilder};

/// One outbound call seen by [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    SendText {
        channel_id: String,
        content: String,
    },
    SendEmbed {
        channel_id: String,
        embed: Embed,
    },
    SendTextEmbed {
        channel_id: String,
        content: String,
        embed: Embed,
    },
    EditEmbed {
        channel_id: String,
        message_id: String,
        embed: Embed,
    },
    DeleteMessage {
        channel_id: String,
        message_id: String,
    },
    AddReaction {
        channel_id: String,
        message_id: String,
        emoji: String,
    },
    RemoveReaction {
        channel_id: String,
        message_id: String,
        emoji: String,
        user_id: String,
    },
}

/// Records every call and answers sends with `sent-<n>` ids.
pub(crate) struct MockTransport {
    self_id: String,
    calls: Mutex<Vec<Call>>,
    next_id: AtomicU64,
}

impl MockTransport {
    pub(crate) fn new(self_id: &str) -> Arc<Self> {
        Arc::new(Self {
            self_id: self_id.to_string(),
            calls: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        })
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn sent(&self, call: Call) -> TransportResult<String> {
        self.record(call);
        Ok(format!("sent-{}", self.next_id.fetch_add(1, Ordering::SeqCst)))
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn self_id(&self) -> &str {
        &self.self_id
    }

    async fn send_text(&self, channel_id: &str, content: &str) -> TransportResult<String> {
        self.sent(Call::SendText {
            channel_id: channel_id.into(),
            content: content.into(),
        })
    }

    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> TransportResult<String> {
        self.sent(Call::SendEmbed {
            channel_id: channel_id.into(),
            embed: embed.clone(),
        })
    }

    async fn send_text_embed(
        &self,
        channel_id: &str,
        content: &str,
        embed: &Embed,
    ) -> TransportResult<String> {
        self.sent(Call::SendTextEmbed {
            channel_id: channel_id.into(),
            content: content.into(),
            embed: embed.clone(),
        })
    }

    async fn edit_embed(
        &self,
        channel_id: &str,
        message_id: &str,
        embed: &Embed,
    ) -> TransportResult<()> {
        self.record(Call::EditEmbed {
            channel_id: channel_id.into(),
            message_id: message_id.into(),
            embed: embed.clone(),
        });
        Ok(())
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> TransportResult<()> {
        self.record(Call::DeleteMessage {
            channel_id: channel_id.into(),
            message_id: message_id.into(),
        });
        Ok(())
    }

    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> TransportResult<()> {
        self.record(Call::AddReaction {
            channel_id: channel_id.into(),
            message_id: message_id.into(),
            emoji: emoji.into(),
        });
        Ok(())
    }

    async fn remove_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
        user_id: &str,
    ) -> TransportResult<()> {
        self.record(Call::RemoveReaction {
            channel_id: channel_id.into(),
            message_id: message_id.into(),
            emoji: emoji.into(),
            user_id: user_id.into(),
        });
        Ok(())
    }
}

/// A message from `user-1` in `chan-1`.
pub(crate) fn message(content: &str) -> MessageEvent {
    MessageEvent::new("msg-1", "chan-1", Author::user("user-1", "alice"), content)
}

/// Builds a router with prefix `!` over `transport`.
pub(crate) fn test_router(
    transport: &Arc<MockTransport>,
    configure: impl FnOnce(RouterBuilder) -> RouterBuilder,
) -> Router {
    let transport: BoxedTransport = Arc::clone(transport) as BoxedTransport;
    configure(Router::builder().prefixes(["!"]))
        .build(transport)
        .expect("test router should build")
}

/// A context for `command` with `raw` as its arguments.
pub(crate) fn context_with_args(
    transport: &Arc<MockTransport>,
    command: Arc<Command>,
    raw: &str,
) -> CommandContext {
    CommandContext::new(
        test_router(transport, |b| b),
        Arc::new(message(raw)),
        Arguments::parse(raw),
        Some(command),
    )
}
