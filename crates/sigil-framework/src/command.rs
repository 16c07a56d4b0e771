//! The command tree.
//!
//! Commands are declared with a [`CommandBuilder`] and frozen into an
//! immutable [`Command`] when the router is built. Freezing validates the
//! tree (every node has a handler, no two siblings share a token) and orders
//! each node's children by their longest token, so lookups never mutate
//! anything and are safe to run from any number of workers.
//!
//! ```rust,ignore
//! let config = Command::new("config")
//!     .alias("cfg")
//!     .ignore_case(true)
//!     .description("Shows or edits the configuration")
//!     .handler(show_config)
//!     .sub_command(
//!         Command::new("set")
//!             .handler(set_usage)
//!             .sub_command(Command::new("prefix").handler(set_prefix)),
//!     );
//! ```

use std::cmp::Reverse;
use std::future::Future;
use std::sync::Arc;

use tracing::trace;

use crate::context::CommandContext;
use crate::error::{RegistrationError, RegistrationResult};
use crate::handler::{BoxedHandler, into_handler};
use crate::matching::TokenSet;

/// Declaration of a command before the tree is frozen.
#[derive(Default)]
pub struct CommandBuilder {
    name: String,
    aliases: Vec<String>,
    ignore_case: bool,
    description: String,
    usage: String,
    example: String,
    flags: Vec<String>,
    children: Vec<CommandBuilder>,
    handler: Option<BoxedHandler>,
}

impl CommandBuilder {
    /// Adds an alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Adds several aliases.
    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Whether the name and aliases match regardless of case.
    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    /// One-line description shown by the help command.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Usage line, without the prefix.
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    /// Example invocation, without the prefix.
    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.example = example.into();
        self
    }

    /// Adds a documented flag. Flags are informational only.
    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.push(flag.into());
        self
    }

    /// Adds a sub-command.
    pub fn sub_command(mut self, child: CommandBuilder) -> Self {
        self.children.push(child);
        self
    }

    /// Sets the handler.
    pub fn handler<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.handler = Some(into_handler(f));
        self
    }

    /// Sets a pre-built handler.
    pub fn handler_boxed(mut self, handler: BoxedHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// The name this command was declared with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validates and freezes this command and its descendants.
    pub(crate) fn build(self, parent_path: Option<&str>) -> RegistrationResult<Arc<Command>> {
        let path = match parent_path {
            Some(parent) => format!("{parent} {}", self.name),
            None => self.name.clone(),
        };

        if self.name.is_empty() || self.aliases.iter().any(String::is_empty) {
            return Err(RegistrationError::EmptyToken { command: path });
        }

        let handler = self
            .handler
            .ok_or_else(|| RegistrationError::MissingHandler {
                command: path.clone(),
            })?;

        let children = self
            .children
            .into_iter()
            .map(|child| child.build(Some(&path)))
            .collect::<RegistrationResult<Vec<_>>>()?;
        let children = freeze_siblings(children, Some(&path))?;

        Ok(Arc::new(Command {
            tokens: TokenSet::new(self.name.clone(), self.aliases.iter().cloned(), self.ignore_case),
            name: self.name,
            aliases: self.aliases,
            description: self.description,
            usage: self.usage,
            example: self.example,
            flags: self.flags,
            path,
            children,
            handler,
        }))
    }
}

/// Rejects ambiguous siblings and orders them by longest token, descending.
///
/// The sort is stable, so equal lengths keep declaration order.
pub(crate) fn freeze_siblings(
    mut siblings: Vec<Arc<Command>>,
    parent_path: Option<&str>,
) -> RegistrationResult<Vec<Arc<Command>>> {
    for (i, first) in siblings.iter().enumerate() {
        for second in &siblings[i + 1..] {
            if let Some(token) = first.tokens.conflict_with(&second.tokens) {
                return Err(RegistrationError::DuplicateToken {
                    token: match parent_path {
                        Some(parent) => format!("{parent} {token}"),
                        None => token.to_string(),
                    },
                    first: first.path.clone(),
                    second: second.path.clone(),
                });
            }
        }
    }

    siblings.sort_by_key(|c| Reverse(c.tokens.longest()));
    Ok(siblings)
}

/// Finds the sibling that `candidate` names.
pub(crate) fn find<'a>(siblings: &'a [Arc<Command>], candidate: &str) -> Option<&'a Arc<Command>> {
    siblings.iter().find(|c| c.tokens.matches(candidate))
}

/// A frozen command node.
pub struct Command {
    name: String,
    aliases: Vec<String>,
    tokens: TokenSet,
    description: String,
    usage: String,
    example: String,
    flags: Vec<String>,
    path: String,
    children: Vec<Arc<Command>>,
    handler: BoxedHandler,
}

impl Command {
    /// Starts declaring a command called `name`.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder {
            name: name.into(),
            ..Default::default()
        }
    }

    /// The declared name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared aliases, in declaration order.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Name and aliases, longest first.
    pub fn tokens(&self) -> &TokenSet {
        &self.tokens
    }

    /// Whether matching ignores case.
    pub fn ignores_case(&self) -> bool {
        self.tokens.ignore_case()
    }

    /// Help description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Usage line.
    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// Example invocation.
    pub fn example(&self) -> &str {
        &self.example
    }

    /// Documented flags.
    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    /// Names from the root down to this node, space-separated.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Sub-commands, in lookup order.
    pub fn sub_commands(&self) -> &[Arc<Command>] {
        &self.children
    }

    /// Whether `candidate` is this command's name or one of its aliases.
    pub fn matches(&self, candidate: &str) -> bool {
        self.tokens.matches(candidate)
    }

    /// Finds the direct child named `name`.
    pub fn sub_command(&self, name: &str) -> Option<&Arc<Command>> {
        find(&self.children, name)
    }

    /// Resolves the node an invocation ends up at, consuming one argument per
    /// level, together with the arguments left for that node.
    pub fn resolve(self: &Arc<Self>, ctx: CommandContext) -> (Arc<Command>, CommandContext) {
        let mut node = Arc::clone(self);
        let mut ctx = ctx;

        loop {
            let child = match ctx.args().first() {
                Some(first) => node.sub_command(first.raw()).cloned(),
                None => None,
            };
            let Some(child) = child else {
                break;
            };

            trace!(parent = %node.path, child = %child.path, "Descending into sub-command");
            ctx = ctx.descend(Arc::clone(&child));
            node = child;
        }

        (node, ctx)
    }

    /// Runs this command: descends into the matching sub-command, if any,
    /// otherwise calls this node's handler.
    pub async fn trigger(self: &Arc<Self>, ctx: CommandContext) {
        let (node, ctx) = self.resolve(ctx);
        node.handler.call(ctx).await;
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("path", &self.path)
            .field("aliases", &self.aliases)
            .field("ignore_case", &self.tokens.ignore_case())
            .field("sub_commands", &self.children.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockTransport, context_with_args};

    use std::sync::Arc;

    use parking_lot::Mutex;

    fn noop() -> CommandBuilder {
        Command::new("noop").handler(|_| async {})
    }

    fn recorder(name: &str, log: &Arc<Mutex<Vec<(String, Vec<String>)>>>) -> CommandBuilder {
        let log = Arc::clone(log);
        let label = name.to_string();
        Command::new(name).handler(move |ctx: CommandContext| {
            let log = Arc::clone(&log);
            let label = label.clone();
            async move {
                let args = ctx.args().iter().map(|a| a.raw().to_string()).collect();
                log.lock().push((label, args));
            }
        })
    }

    #[test]
    fn test_missing_handler_rejected() {
        let err = Command::new("config")
            .sub_command(Command::new("set"))
            .handler(|_| async {})
            .build(None)
            .unwrap_err();
        assert_eq!(
            err,
            RegistrationError::MissingHandler {
                command: "config set".into()
            }
        );
    }

    #[test]
    fn test_empty_alias_rejected() {
        let err = noop().alias("").build(None).unwrap_err();
        assert!(matches!(err, RegistrationError::EmptyToken { .. }));
    }

    #[test]
    fn test_duplicate_sibling_tokens_rejected() {
        let err = Command::new("root")
            .handler(|_| async {})
            .sub_command(Command::new("list").alias("ls").handler(|_| async {}))
            .sub_command(Command::new("LS").ignore_case(true).handler(|_| async {}))
            .build(None)
            .unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateToken { .. }));
    }

    #[test]
    fn test_children_sorted_by_longest_token() {
        let root = Command::new("root")
            .handler(|_| async {})
            .sub_command(Command::new("a").handler(|_| async {}))
            .sub_command(Command::new("bbb").handler(|_| async {}))
            .sub_command(Command::new("c").alias("cccc").handler(|_| async {}))
            .sub_command(Command::new("d").handler(|_| async {}))
            .build(None)
            .unwrap();
        let order: Vec<&str> = root.sub_commands().iter().map(|c| c.name()).collect();
        assert_eq!(order, vec!["c", "bbb", "a", "d"]);
    }

    #[test]
    fn test_sub_command_lookup_by_alias_and_case() {
        let root = Command::new("root")
            .handler(|_| async {})
            .sub_command(
                Command::new("remove")
                    .alias("rm")
                    .ignore_case(true)
                    .handler(|_| async {}),
            )
            .sub_command(Command::new("Add").handler(|_| async {}))
            .build(None)
            .unwrap();

        assert_eq!(root.sub_command("RM").map(|c| c.name()), Some("remove"));
        assert_eq!(root.sub_command("Add").map(|c| c.name()), Some("Add"));
        assert!(root.sub_command("add").is_none());
    }

    #[tokio::test]
    async fn test_recursion_consumes_one_token_per_level() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let config = recorder("config", &log)
            .sub_command(recorder("set", &log).sub_command(recorder("prefix", &log)))
            .build(None)
            .unwrap();

        let transport = MockTransport::new("bot");
        let ctx = context_with_args(&transport, Arc::clone(&config), "set prefix foo");
        config.trigger(ctx).await;

        let log = log.lock();
        assert_eq!(log.as_slice(), &[("prefix".to_string(), vec!["foo".to_string()])]);
    }

    #[tokio::test]
    async fn test_falls_back_to_own_handler_with_unconsumed_args() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let config = recorder("config", &log)
            .sub_command(recorder("set", &log))
            .build(None)
            .unwrap();

        let transport = MockTransport::new("bot");
        let ctx = context_with_args(&transport, Arc::clone(&config), "get prefix");
        config.trigger(ctx).await;

        let log = log.lock();
        assert_eq!(
            log.as_slice(),
            &[(
                "config".to_string(),
                vec!["get".to_string(), "prefix".to_string()]
            )]
        );
    }

    #[tokio::test]
    async fn test_resolve_reports_node_and_remaining_args() {
        let config = Command::new("config")
            .handler(|_| async {})
            .sub_command(Command::new("set").handler(|_| async {}))
            .build(None)
            .unwrap();

        let transport = MockTransport::new("bot");
        let ctx = context_with_args(&transport, Arc::clone(&config), "set");
        let (node, ctx) = config.resolve(ctx);
        assert_eq!(node.path(), "config set");
        assert!(ctx.args().is_empty());
        assert_eq!(ctx.command().map(|c| c.name()), Some("set"));
    }
}
