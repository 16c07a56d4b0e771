//! The router: prefix handling, command lookup and dispatch.
//!
//! A [`Router`] is built once from a [`RouterBuilder`] and is cheap to clone.
//! The transport feeds it inbound events through [`Router::handle_message`]
//! and [`Router::handle_reaction`]. For each message the router:
//!
//! 1. drops it if the author is a bot (unless bots are allowed);
//! 2. runs the ping handler directly if the message is just a mention of
//!    the bot;
//! 3. strips the longest matching prefix, dropping unprefixed messages;
//! 4. trims the remainder, dropping it if nothing is left;
//! 5. runs every middleware in registration order;
//! 6. submits one job to the worker pool for *every* top-level command the
//!    remainder starts with (as a whole word).
//!
//! Resolution happens on the caller's task; handlers run on the pool.
//!
//! # Example
//!
//! ```rust,ignore
//! let router = Router::builder()
//!     .prefixes(["!", "?"])
//!     .ignore_prefix_case(true)
//!     .default_help(true)
//!     .command(Command::new("ping").handler(|ctx: CommandContext| async move {
//!         let _ = ctx.respond_text("Pong!").await;
//!     }))
//!     .build(transport)?;
//!
//! router.handle_message(event).await;
//! ```

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sigil_core::{BoxedTransport, MessageEvent, ReactionEvent};
use tracing::{debug, info, trace, warn};

use crate::args::Arguments;
use crate::command::{Command, CommandBuilder, find, freeze_siblings};
use crate::context::{CommandContext, StorageHandle};
use crate::error::{RegistrationError, RegistrationResult};
use crate::handler::{BoxedHandler, BoxedMiddleware, into_handler};
use crate::help::{self, HELP_STORE};
use crate::interaction::{EvictionPolicy, InteractionStores};
use crate::matching::TokenSet;
use crate::worker::{DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS, Job, WorkerPool};

/// Plain router options, loadable from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterSettings {
    /// Command prefixes. The first one is shown in help texts.
    pub prefixes: Vec<String>,
    /// Whether prefixes match regardless of case.
    pub ignore_prefix_case: bool,
    /// Whether messages from bot accounts are dispatched.
    pub bots_allowed: bool,
    /// Number of workers running handlers.
    pub workers: usize,
    /// Number of jobs that may wait for a worker.
    pub queue_capacity: usize,
    /// Whether to register the built-in `help` command.
    pub default_help: bool,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            prefixes: vec!["!".to_string()],
            ignore_prefix_case: false,
            bots_allowed: false,
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            default_help: false,
        }
    }
}

/// Why a message was not dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The author is a bot and bots are not allowed.
    BotAuthor,
    /// The content does not start with a prefix.
    NoPrefix,
    /// Nothing but whitespace follows the prefix.
    Empty,
    /// No top-level command matches.
    NoCommand,
    /// The worker pool is shut down.
    QueueClosed,
}

/// What [`Router::handle_message`] did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The message was dropped.
    Ignored(SkipReason),
    /// The ping handler ran.
    Pinged,
    /// This many jobs were queued.
    Enqueued(usize),
}

type StoreInit = Box<dyn FnOnce(&InteractionStores) + Send>;

/// Collects commands and options, then builds a [`Router`].
pub struct RouterBuilder {
    settings: RouterSettings,
    commands: Vec<CommandBuilder>,
    middleware: Vec<BoxedMiddleware>,
    ping_handler: Option<BoxedHandler>,
    storage: Option<StorageHandle>,
    eviction: EvictionPolicy,
    stores: Vec<StoreInit>,
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self {
            settings: RouterSettings::default(),
            commands: Vec::new(),
            middleware: Vec::new(),
            ping_handler: None,
            storage: None,
            eviction: EvictionPolicy::UNBOUNDED,
            stores: Vec::new(),
        }
    }
}

impl RouterBuilder {
    /// Replaces every plain option at once.
    pub fn with_settings(mut self, settings: RouterSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replaces the prefixes.
    pub fn prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Whether prefixes match regardless of case.
    pub fn ignore_prefix_case(mut self, ignore: bool) -> Self {
        self.settings.ignore_prefix_case = ignore;
        self
    }

    /// Whether messages from bot accounts are dispatched.
    pub fn bots_allowed(mut self, allowed: bool) -> Self {
        self.settings.bots_allowed = allowed;
        self
    }

    /// Number of workers.
    pub fn workers(mut self, workers: usize) -> Self {
        self.settings.workers = workers;
        self
    }

    /// Job queue capacity.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.settings.queue_capacity = capacity;
        self
    }

    /// Registers the built-in `help` command and its page store.
    pub fn default_help(mut self, enabled: bool) -> Self {
        self.settings.default_help = enabled;
        self
    }

    /// Registers a top-level command.
    pub fn command(mut self, command: CommandBuilder) -> Self {
        self.commands.push(command);
        self
    }

    /// Adds a middleware. Middleware runs in registration order.
    pub fn middleware<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.middleware.push(Arc::new(f));
        self
    }

    /// Sets the handler run when a message only mentions the bot.
    pub fn ping_handler<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.ping_handler = Some(into_handler(f));
        self
    }

    /// Sets the storage handle passed to every context.
    pub fn storage(mut self, storage: StorageHandle) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Limits applied to every interaction store.
    pub fn eviction(mut self, policy: EvictionPolicy) -> Self {
        self.eviction = policy;
        self
    }

    /// Creates the interaction store `name` holding `V` values when the
    /// router is built.
    pub fn interaction_store<V>(mut self, name: impl Into<String>) -> Self
    where
        V: Clone + Send + Sync + 'static,
    {
        let name = name.into();
        self.stores.push(Box::new(move |stores: &InteractionStores| {
            stores.init::<V>(&name);
        }));
        self
    }

    /// Validates the configuration, freezes the command tree and starts
    /// the worker pool.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self, transport: BoxedTransport) -> RegistrationResult<Router> {
        let settings = self.settings;
        if settings.prefixes.is_empty() || settings.prefixes.iter().any(String::is_empty) {
            return Err(RegistrationError::NoPrefixes);
        }
        if settings.workers == 0 {
            return Err(RegistrationError::NoWorkers);
        }
        if settings.queue_capacity == 0 {
            return Err(RegistrationError::ZeroCapacity);
        }

        let mut declared = self.commands;
        if settings.default_help {
            declared.push(help::help_command());
        }
        let commands = declared
            .into_iter()
            .map(|c| c.build(None))
            .collect::<RegistrationResult<Vec<_>>>()?;
        let lookup = freeze_siblings(commands.clone(), None)?;

        let stores = InteractionStores::new(self.eviction);
        for init in self.stores {
            init(&stores);
        }
        if settings.default_help {
            stores.init::<i64>(HELP_STORE);
        }

        let pool = WorkerPool::spawn(settings.workers, settings.queue_capacity);

        info!(
            commands = commands.len(),
            prefixes = ?settings.prefixes,
            default_help = settings.default_help,
            "Router built"
        );

        Ok(Router {
            inner: Arc::new(RouterInner {
                transport,
                prefix_set: TokenSet::from_list(
                    settings.prefixes.iter().cloned(),
                    settings.ignore_prefix_case,
                ),
                prefixes: settings.prefixes,
                bots_allowed: settings.bots_allowed,
                default_help: settings.default_help,
                commands,
                lookup,
                middleware: self.middleware,
                ping_handler: self.ping_handler,
                storage: self.storage,
                stores,
                pool,
            }),
        })
    }
}

struct RouterInner {
    transport: BoxedTransport,
    /// Configured order; the first is the one shown in help.
    prefixes: Vec<String>,
    prefix_set: TokenSet,
    bots_allowed: bool,
    default_help: bool,
    /// Registration order.
    commands: Vec<Arc<Command>>,
    /// Longest token first.
    lookup: Vec<Arc<Command>>,
    middleware: Vec<BoxedMiddleware>,
    ping_handler: Option<BoxedHandler>,
    storage: Option<StorageHandle>,
    stores: InteractionStores,
    pool: WorkerPool<Job>,
}

/// A built, immutable router.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

impl Router {
    /// Starts building a router.
    pub fn builder() -> RouterBuilder {
        RouterBuilder::default()
    }

    /// The platform connection.
    pub fn transport(&self) -> &BoxedTransport {
        &self.inner.transport
    }

    /// The storage handle, if one was configured.
    pub fn storage_handle(&self) -> Option<&StorageHandle> {
        self.inner.storage.as_ref()
    }

    /// The router's interaction stores.
    pub fn interaction_stores(&self) -> &InteractionStores {
        &self.inner.stores
    }

    /// The worker pool.
    pub fn pool(&self) -> &WorkerPool<Job> {
        &self.inner.pool
    }

    /// Prefixes in configured order.
    pub fn prefixes(&self) -> &[String] {
        &self.inner.prefixes
    }

    /// The first configured prefix.
    pub fn primary_prefix(&self) -> &str {
        self.inner.prefixes.first().map_or("", String::as_str)
    }

    /// Top-level commands in registration order.
    pub fn commands(&self) -> &[Arc<Command>] {
        &self.inner.commands
    }

    /// Finds the top-level command named `name` (name or alias).
    pub fn command(&self, name: &str) -> Option<&Arc<Command>> {
        find(&self.inner.lookup, name)
    }

    /// Whether bot authors are dispatched.
    pub fn bots_allowed(&self) -> bool {
        self.inner.bots_allowed
    }

    /// Handles a "message created" event.
    pub async fn handle_message(&self, event: MessageEvent) -> DispatchOutcome {
        let inner = &self.inner;

        if event.author.bot && !inner.bots_allowed {
            trace!(author = %event.author.id, "Ignoring bot author");
            return DispatchOutcome::Ignored(SkipReason::BotAuthor);
        }

        let event = Arc::new(event);

        if let Some(ping) = &inner.ping_handler {
            if event.is_mention_of(inner.transport.self_id()) {
                debug!(channel = %event.channel_id, "Running ping handler");
                let ctx =
                    CommandContext::new(self.clone(), Arc::clone(&event), Arguments::empty(), None);
                ping.call(ctx).await;
                return DispatchOutcome::Pinged;
            }
        }

        let Some(rest) = inner.prefix_set.strip_prefix(&event.content) else {
            return DispatchOutcome::Ignored(SkipReason::NoPrefix);
        };
        let content = rest.trim();
        if content.is_empty() {
            return DispatchOutcome::Ignored(SkipReason::Empty);
        }

        if !inner.middleware.is_empty() {
            let ctx = CommandContext::new(
                self.clone(),
                Arc::clone(&event),
                Arguments::parse(content),
                None,
            );
            for middleware in &inner.middleware {
                middleware.call(ctx.clone()).await;
            }
        }

        let mut enqueued = 0;
        for command in &inner.lookup {
            let Some(args) = command.tokens().strip_word(content) else {
                continue;
            };

            trace!(command = %command.name(), args = %args.trim(), "Matched command");
            let ctx = CommandContext::new(
                self.clone(),
                Arc::clone(&event),
                Arguments::parse(args),
                Some(Arc::clone(command)),
            );
            if inner
                .pool
                .submit(Job::new(ctx, Arc::clone(command)))
                .await
                .is_err()
            {
                warn!(command = %command.name(), "Worker pool is shut down, dropping job");
                if enqueued == 0 {
                    return DispatchOutcome::Ignored(SkipReason::QueueClosed);
                }
                break;
            }
            enqueued += 1;
        }

        match enqueued {
            0 => {
                trace!(content = %content, "No command matched");
                DispatchOutcome::Ignored(SkipReason::NoCommand)
            }
            1 => DispatchOutcome::Enqueued(1),
            n => {
                debug!(count = n, content = %content, "Several commands matched one message");
                DispatchOutcome::Enqueued(n)
            }
        }
    }

    /// Handles a "reaction added" event.
    ///
    /// Only the built-in help pages react; without them this does nothing.
    pub async fn handle_reaction(&self, event: &ReactionEvent) {
        if self.inner.default_help {
            help::handle_reaction(self, event).await;
        }
    }

    /// Stops accepting jobs and waits for queued ones to finish.
    pub async fn shutdown(&self) {
        self.inner.pool.shutdown().await;
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("prefixes", &self.inner.prefixes)
            .field("commands", &self.inner.commands)
            .field("middleware", &self.inner.middleware.len())
            .field("pool", &self.inner.pool)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, MockTransport, message, test_router};

    use parking_lot::Mutex;
    use sigil_core::Author;

    type Log = Arc<Mutex<Vec<String>>>;

    fn logging(name: &str, log: &Log) -> CommandBuilder {
        let log = Arc::clone(log);
        let label = name.to_string();
        Command::new(name).handler(move |ctx: CommandContext| {
            let log = Arc::clone(&log);
            let label = label.clone();
            async move {
                log.lock().push(format!("{label}:{}", ctx.args().raw()));
            }
        })
    }

    #[tokio::test]
    async fn test_bot_authors_filtered() {
        let transport = MockTransport::new("bot");
        let log = Log::default();
        let router = test_router(&transport, |b| b.command(logging("ping", &log)));

        let from_bot = MessageEvent::new("m", "c", Author::bot("b2", "other"), "!ping");
        assert_eq!(
            router.handle_message(from_bot.clone()).await,
            DispatchOutcome::Ignored(SkipReason::BotAuthor)
        );

        let router = test_router(&transport, |b| {
            b.bots_allowed(true).command(logging("ping", &log))
        });
        assert_eq!(router.handle_message(from_bot).await, DispatchOutcome::Enqueued(1));
        router.shutdown().await;
        assert_eq!(log.lock().as_slice(), &["ping:".to_string()]);
    }

    #[tokio::test]
    async fn test_ping_shortcut() {
        let transport = MockTransport::new("42");
        let router = test_router(&transport, |b| {
            b.ping_handler(|ctx: CommandContext| async move {
                let _ = ctx.respond_text("My prefix is !").await;
            })
        });

        assert_eq!(router.handle_message(message("<@42>")).await, DispatchOutcome::Pinged);
        assert_eq!(router.handle_message(message("<@!42>")).await, DispatchOutcome::Pinged);
        assert_eq!(
            router.handle_message(message("<@42> hi")).await,
            DispatchOutcome::Ignored(SkipReason::NoPrefix)
        );
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_mention_without_ping_handler_is_unprefixed() {
        let transport = MockTransport::new("42");
        let router = test_router(&transport, |b| b);
        assert_eq!(
            router.handle_message(message("<@42>")).await,
            DispatchOutcome::Ignored(SkipReason::NoPrefix)
        );
    }

    #[tokio::test]
    async fn test_prefix_handling() {
        let transport = MockTransport::new("bot");
        let log = Log::default();
        let router = test_router(&transport, |b| {
            b.prefixes(["!", "!!", "sigil "])
                .ignore_prefix_case(true)
                .command(logging("ping", &log))
        });

        assert_eq!(router.handle_message(message("!!ping")).await, DispatchOutcome::Enqueued(1));
        assert_eq!(router.handle_message(message("SIGIL ping")).await, DispatchOutcome::Enqueued(1));
        assert_eq!(
            router.handle_message(message("?ping")).await,
            DispatchOutcome::Ignored(SkipReason::NoPrefix)
        );
        assert_eq!(
            router.handle_message(message("!   ")).await,
            DispatchOutcome::Ignored(SkipReason::Empty)
        );
        assert_eq!(
            router.handle_message(message("!pong")).await,
            DispatchOutcome::Ignored(SkipReason::NoCommand)
        );
        assert_eq!(router.primary_prefix(), "!");
    }

    #[tokio::test]
    async fn test_prefix_case_sensitive_by_default() {
        let transport = MockTransport::new("bot");
        let router = test_router(&transport, |b| {
            b.prefixes(["bot!"]).command(Command::new("ping").handler(|_| async {}))
        });
        assert_eq!(
            router.handle_message(message("BOT!ping")).await,
            DispatchOutcome::Ignored(SkipReason::NoPrefix)
        );
    }

    #[tokio::test]
    async fn test_longest_match_and_word_boundary() {
        let transport = MockTransport::new("bot");
        let log = Log::default();
        let router = test_router(&transport, |b| {
            b.command(logging("hint", &log).alias("h"))
                .command(logging("help", &log))
        });

        assert_eq!(router.handle_message(message("!help me")).await, DispatchOutcome::Enqueued(1));
        assert_eq!(
            router.handle_message(message("!helpme")).await,
            DispatchOutcome::Ignored(SkipReason::NoCommand)
        );
        router.shutdown().await;
        assert_eq!(log.lock().as_slice(), &["help:me".to_string()]);
    }

    #[tokio::test]
    async fn test_every_matching_command_is_enqueued() {
        let transport = MockTransport::new("bot");
        let log = Log::default();
        let router = test_router(&transport, |b| {
            b.command(logging("stats", &log))
                .command(logging("stats all", &log))
        });

        assert_eq!(
            router.handle_message(message("!stats all now")).await,
            DispatchOutcome::Enqueued(2)
        );
        router.shutdown().await;

        let mut log = log.lock().clone();
        log.sort();
        assert_eq!(log, vec!["stats all:now".to_string(), "stats:all now".to_string()]);
    }

    #[tokio::test]
    async fn test_middleware_runs_in_order_before_jobs() {
        let transport = MockTransport::new("bot");
        let log = Log::default();
        let (a, b) = (Arc::clone(&log), Arc::clone(&log));
        let router = test_router(&transport, |builder| {
            builder
                .middleware(move |ctx: CommandContext| {
                    let log = Arc::clone(&a);
                    async move { log.lock().push(format!("first:{}", ctx.args().raw())) }
                })
                .middleware(move |_| {
                    let log = Arc::clone(&b);
                    async move { log.lock().push("second".to_string()) }
                })
                .command(logging("echo", &log))
        });

        // Middleware also sees messages that match no command.
        router.handle_message(message("!nothing")).await;
        router.handle_message(message("!echo hi")).await;
        router.shutdown().await;

        assert_eq!(
            log.lock().as_slice(),
            &[
                "first:nothing".to_string(),
                "second".to_string(),
                "first:echo hi".to_string(),
                "second".to_string(),
                "echo:hi".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_end_to_end_sub_command_dispatch() {
        let transport = MockTransport::new("bot");
        let router = test_router(&transport, |b| {
            b.command(
                Command::new("config")
                    .ignore_case(true)
                    .handler(|_| async {})
                    .sub_command(Command::new("set").handler(|ctx: CommandContext| async move {
                        let reply = format!("set {}", ctx.args().raw());
                        let _ = ctx.respond_text(&reply).await;
                    })),
            )
        });

        router.handle_message(message("!CONFIG set  prefix ?")).await;
        router.shutdown().await;

        assert_eq!(
            transport.calls(),
            vec![Call::SendText {
                channel_id: "chan-1".into(),
                content: "set prefix ?".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_reports_closed_queue() {
        let transport = MockTransport::new("bot");
        let router = test_router(&transport, |b| b.command(Command::new("ping").handler(|_| async {})));
        router.shutdown().await;
        assert_eq!(
            router.handle_message(message("!ping")).await,
            DispatchOutcome::Ignored(SkipReason::QueueClosed)
        );
    }

    #[tokio::test]
    async fn test_build_rejects_bad_configuration() {
        let transport = MockTransport::new("bot");
        let build = |b: RouterBuilder| b.build(transport.clone()).unwrap_err();

        assert_eq!(build(Router::builder().workers(0)), RegistrationError::NoWorkers);
        assert_eq!(
            build(Router::builder().queue_capacity(0)),
            RegistrationError::ZeroCapacity
        );
        assert_eq!(
            build(Router::builder().prefixes(Vec::<String>::new())),
            RegistrationError::NoPrefixes
        );
        assert!(matches!(
            build(
                Router::builder()
                    .default_help(true)
                    .command(Command::new("help").handler(|_| async {}))
            ),
            RegistrationError::DuplicateToken { .. }
        ));
    }

    #[tokio::test]
    async fn test_declared_interaction_stores_exist() {
        let transport = MockTransport::new("bot");
        let router = test_router(&transport, |b| b.interaction_store::<String>("votes"));

        assert!(router.interaction_stores().get::<String>("votes").is_some());
        assert!(!router.interaction_stores().contains(HELP_STORE));
    }

    #[tokio::test]
    async fn test_lookup_by_alias() {
        let transport = MockTransport::new("bot");
        let router = test_router(&transport, |b| {
            b.command(Command::new("remove").alias("rm").handler(|_| async {}))
        });
        assert_eq!(router.command("rm").map(|c| c.name()), Some("remove"));
        assert!(router.command("delete").is_none());
    }
}
