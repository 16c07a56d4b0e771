//! Per-invocation context.
//!
//! A [`CommandContext`] is built by the router for every dispatched command
//! (and for the ping handler and middleware). Descending into a sub-command
//! builds a fresh context that shares the transport, event, router and
//! storage but carries re-sliced arguments and the narrower command.

use std::any::Any;
use std::sync::Arc;

use sigil_core::{BoxedTransport, Embed, MessageEvent, TransportResult};

use crate::args::Arguments;
use crate::command::Command;
use crate::router::Router;

/// An opaque storage handle passed through to handlers untouched.
///
/// Usually a database pool; handlers get it back with
/// [`CommandContext::storage`].
pub type StorageHandle = Arc<dyn Any + Send + Sync>;

/// The context handed to command handlers, the ping handler and middleware.
#[derive(Clone)]
pub struct CommandContext {
    transport: BoxedTransport,
    event: Arc<MessageEvent>,
    args: Arguments,
    router: Router,
    command: Option<Arc<Command>>,
    storage: Option<StorageHandle>,
}

impl CommandContext {
    pub(crate) fn new(
        router: Router,
        event: Arc<MessageEvent>,
        args: Arguments,
        command: Option<Arc<Command>>,
    ) -> Self {
        Self {
            transport: Arc::clone(router.transport()),
            storage: router.storage_handle().cloned(),
            event,
            args,
            router,
            command,
        }
    }

    /// Builds the context for `child`, dropping the first argument.
    pub(crate) fn descend(&self, child: Arc<Command>) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            event: Arc::clone(&self.event),
            args: self.args.rest(1),
            router: self.router.clone(),
            command: Some(child),
            storage: self.storage.clone(),
        }
    }

    /// The platform connection.
    pub fn transport(&self) -> &BoxedTransport {
        &self.transport
    }

    /// The message that triggered this invocation.
    pub fn event(&self) -> &MessageEvent {
        &self.event
    }

    /// Arguments left for the resolved command.
    pub fn args(&self) -> &Arguments {
        &self.args
    }

    /// The router that dispatched this invocation.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// The resolved command. `None` for the ping handler and middleware.
    pub fn command(&self) -> Option<&Arc<Command>> {
        self.command.as_ref()
    }

    /// The raw storage handle, if one was configured.
    pub fn storage_handle(&self) -> Option<&StorageHandle> {
        self.storage.as_ref()
    }

    /// The storage handle downcast to `T`.
    ///
    /// Returns `None` when no handle is configured or it is not a `T`.
    pub fn storage<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.storage.clone()?.downcast::<T>().ok()
    }

    /// Replies with plain text in the originating channel.
    pub async fn respond_text(&self, text: &str) -> TransportResult<String> {
        self.transport.send_text(&self.event.channel_id, text).await
    }

    /// Replies with an embed in the originating channel.
    pub async fn respond_embed(&self, embed: &Embed) -> TransportResult<String> {
        self.transport
            .send_embed(&self.event.channel_id, embed)
            .await
    }

    /// Replies with text and an embed in the originating channel.
    pub async fn respond_text_embed(&self, text: &str, embed: &Embed) -> TransportResult<String> {
        self.transport
            .send_text_embed(&self.event.channel_id, text, embed)
            .await
    }
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("event", &self.event)
            .field("args", &self.args)
            .field("command", &self.command.as_ref().map(|c| c.path()))
            .field("has_storage", &self.storage.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, MockTransport, test_router};

    use sigil_core::Author;

    struct Db {
        url: &'static str,
    }

    #[tokio::test]
    async fn test_storage_downcast() {
        let transport = MockTransport::new("bot");
        let db: StorageHandle = Arc::new(Db { url: "sqlite::memory:" });
        let router = test_router(&transport, |b| b.storage(db));

        let event = Arc::new(MessageEvent::new("m", "c", Author::user("u", "u"), "!x"));
        let ctx = CommandContext::new(router, event, Arguments::empty(), None);

        assert_eq!(ctx.storage::<Db>().map(|d| d.url), Some("sqlite::memory:"));
        assert!(ctx.storage::<String>().is_none());
    }

    #[tokio::test]
    async fn test_respond_targets_originating_channel() {
        let transport = MockTransport::new("bot");
        let router = test_router(&transport, |b| b);

        let event = Arc::new(MessageEvent::new("m", "chan-7", Author::user("u", "u"), "!x"));
        let ctx = CommandContext::new(router, event, Arguments::empty(), None);

        ctx.respond_text("hello").await.unwrap();
        ctx.respond_embed(&Embed::new().title("t")).await.unwrap();

        let calls = transport.calls();
        assert!(matches!(&calls[0], Call::SendText { channel_id, content }
            if channel_id == "chan-7" && content == "hello"));
        assert!(matches!(&calls[1], Call::SendEmbed { channel_id, .. } if channel_id == "chan-7"));
    }
}
