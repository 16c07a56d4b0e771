//! Handler traits.
//!
//! Command handlers, the ping handler and middleware are all plain async
//! closures taking a [`CommandContext`] by value:
//!
//! ```rust,ignore
//! Command::new("ping").handler(|ctx: CommandContext| async move {
//!     let _ = ctx.respond_text("Pong!").await;
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::context::CommandContext;

/// Something that can run a command invocation.
pub trait CommandHandler: Send + Sync + 'static {
    /// Runs the handler to completion.
    fn call(&self, ctx: CommandContext) -> BoxFuture<'static, ()>;
}

impl<F, Fut> CommandHandler for F
where
    F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn call(&self, ctx: CommandContext) -> BoxFuture<'static, ()> {
        (self)(ctx).boxed()
    }
}

/// A shared, type-erased command handler.
pub type BoxedHandler = Arc<dyn CommandHandler>;

/// Wraps a handler into a [`BoxedHandler`].
pub fn into_handler<H: CommandHandler>(handler: H) -> BoxedHandler {
    Arc::new(handler)
}

/// A side-effect hook run for every prefixed message before command lookup.
///
/// Middleware cannot veto or rewrite the dispatch; its output is ignored.
pub trait Middleware: Send + Sync + 'static {
    /// Runs the hook.
    fn call(&self, ctx: CommandContext) -> BoxFuture<'static, ()>;
}

impl<F, Fut> Middleware for F
where
    F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn call(&self, ctx: CommandContext) -> BoxFuture<'static, ()> {
        (self)(ctx).boxed()
    }
}

/// A shared, type-erased middleware.
pub type BoxedMiddleware = Arc<dyn Middleware>;
