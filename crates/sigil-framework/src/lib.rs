//! # Sigil Framework
//!
//! Command resolution and concurrent dispatch for chat bots.
//!
//! This layer provides:
//! - Name/alias matching with longest-match and case folding
//! - An immutable command tree with recursive sub-commands
//! - The router: prefixes, ping shortcut, middleware and dispatch
//! - A bounded job queue drained by a fixed worker pool
//! - Typed interaction stores for multi-step flows
//! - The built-in paginated `help` command
//!
//! Everything platform-specific lives behind the
//! [`Transport`](sigil_core::Transport) trait from `sigil-core`.

pub mod args;
pub mod command;
pub mod context;
pub mod error;
pub mod handler;
pub mod help;
pub mod interaction;
pub mod matching;
pub mod pagination;
pub mod router;
pub mod worker;

#[cfg(test)]
mod testing;

pub use args::{Argument, Arguments};
pub use command::{Command, CommandBuilder};
pub use context::{CommandContext, StorageHandle};
pub use error::{PoolClosed, RegistrationError, RegistrationResult};
pub use handler::{
    BoxedHandler, BoxedMiddleware, CommandHandler, Middleware, into_handler,
};
pub use help::{HELP_PAGE_SIZE, HELP_STORE};
pub use interaction::{EvictionPolicy, InteractionStore, InteractionStores, interaction_key};
pub use matching::TokenSet;
pub use pagination::{PageAction, Pagination};
pub use router::{DispatchOutcome, Router, RouterBuilder, RouterSettings, SkipReason};
pub use worker::{DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS, Job, Task, WorkerPool};
