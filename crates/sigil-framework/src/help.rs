//! The built-in `help` command.
//!
//! Enabled with [`RouterBuilder::default_help`](crate::RouterBuilder::default_help).
//! Without arguments it posts the paginated command list and decorates it
//! with ⬅️ ❌ ➡️ reactions; the page each user is looking at lives in the
//! [`HELP_STORE`] interaction store. With arguments it walks the command tree
//! and describes the command found there.

use sigil_core::{Embed, ReactionEvent};
use tracing::{debug, warn};

use crate::command::{Command, CommandBuilder};
use crate::context::CommandContext;
use crate::interaction::interaction_key;
use crate::pagination::{PageAction, Pagination};
use crate::router::Router;

/// Name of the interaction store that tracks help pages.
pub const HELP_STORE: &str = "help_pages";

/// Commands per help page.
pub const HELP_PAGE_SIZE: usize = 5;

/// Declares the `help` command.
pub fn help_command() -> CommandBuilder {
    Command::new("help")
        .ignore_case(true)
        .description(
            "Lists all the available commands or displays some information about a specific command",
        )
        .usage("help [command name]")
        .example("help yourCommand")
        .handler(help)
}

async fn help(ctx: CommandContext) {
    if ctx.args().is_empty() {
        send_command_list(&ctx).await;
    } else {
        send_command_info(&ctx).await;
    }
}

async fn send_command_list(ctx: &CommandContext) {
    let (embed, page) = render_command_list(ctx.router(), 1);
    let channel_id = &ctx.event().channel_id;

    let message_id = match ctx.respond_embed(&embed).await {
        Ok(id) => id,
        Err(e) => {
            warn!(channel = %channel_id, error = %e, "Failed to send help page");
            return;
        }
    };

    for emoji in PageAction::controls() {
        if let Err(e) = ctx
            .transport()
            .add_reaction(channel_id, &message_id, emoji)
            .await
        {
            warn!(message = %message_id, emoji, error = %e, "Failed to add help reaction");
        }
    }

    match ctx.router().interaction_stores().get::<i64>(HELP_STORE) {
        Some(store) => store.set(
            interaction_key(channel_id, &message_id, &ctx.event().author.id),
            page,
        ),
        None => warn!(store = HELP_STORE, "Help store missing, page will not react"),
    }
}

async fn send_command_info(ctx: &CommandContext) {
    let router = ctx.router();
    let mut names = ctx.args().iter();

    let mut command = names.next().and_then(|name| router.command(name.raw())).cloned();
    for name in names {
        command = command.and_then(|c| c.sub_command(name.raw()).cloned());
    }

    let embed = render_command_info(router.primary_prefix(), command.as_deref());
    if let Err(e) = ctx.respond_embed(&embed).await {
        warn!(channel = %ctx.event().channel_id, error = %e, "Failed to send command information");
    }
}

/// Renders page `page` of the command list, clamped to the pages that
/// exist. Returns the embed and the page actually rendered.
pub fn render_command_list(router: &Router, page: i64) -> (Embed, i64) {
    let commands = router.commands();
    let pagination = Pagination::new(commands.len(), HELP_PAGE_SIZE);
    let page = pagination.clamp(page);
    let prefix = router.primary_prefix();

    let mut embed = Embed::new()
        .title(format!(
            "Command List (Page {page}/{})",
            pagination.page_count()
        ))
        .description(format!(
            "These are all the available commands. Type `{prefix}help <command_name>` to find out more about a specific command."
        ))
        .color(Embed::COLOR_INFO)
        .timestamp_now();

    for command in &commands[pagination.range(page)] {
        embed = embed.field(command.name(), format!("`{}`", command.description()));
    }

    (embed, page)
}

/// Renders the description of `command`, or an error embed when it is
/// `None`.
pub fn render_command_info(prefix: &str, command: Option<&Command>) -> Embed {
    let Some(command) = command else {
        return Embed::new()
            .title("Error")
            .color(Embed::COLOR_ERROR)
            .timestamp_now()
            .field(
                "Message",
                format!(
                    "```The given command doesn't exist. Type `{prefix}help` for a list of available commands.```"
                ),
            );
    };

    let sub_commands = if command.sub_commands().is_empty() {
        "No sub commands".to_string()
    } else {
        let names: Vec<&str> = command.sub_commands().iter().map(|c| c.name()).collect();
        format!("`{}`", names.join("`, `"))
    };

    let aliases = if command.aliases().is_empty() {
        "No aliases".to_string()
    } else {
        format!("`{}`", command.aliases().join("`, `"))
    };

    Embed::new()
        .title("Command Information")
        .description(format!(
            "Displaying the information for the `{}` command.",
            command.name()
        ))
        .color(Embed::COLOR_INFO)
        .timestamp_now()
        .field("Name", format!("`{}`", command.name()))
        .field("Sub Commands", sub_commands)
        .field("Aliases", aliases)
        .field("Description", format!("```{}```", command.description()))
        .field("Usage", format!("```{prefix}{}```", command.usage()))
        .field("Example", format!("```{prefix}{}```", command.example()))
}

/// Turns the page of a help listing in response to a reaction.
///
/// Reactions from the bot itself, on untracked messages, or with an emoji
/// that isn't a page control are ignored. The stored page is updated
/// atomically, so reactions handled concurrently never lose a page turn;
/// the edits they send may still reach the platform out of order.
pub async fn handle_reaction(router: &Router, event: &ReactionEvent) {
    let transport = router.transport();
    if event.user_id == transport.self_id() {
        return;
    }

    let Some(store) = router.interaction_stores().get::<i64>(HELP_STORE) else {
        return;
    };
    let key = interaction_key(&event.channel_id, &event.message_id, &event.user_id);
    let Some(page) = store.get(&key) else {
        return;
    };
    if page <= 0 {
        return;
    }
    let Some(action) = PageAction::from_emoji(&event.emoji) else {
        return;
    };

    debug!(key = %key, page, ?action, "Help page reaction");

    if action == PageAction::Close {
        if let Err(e) = transport
            .delete_message(&event.channel_id, &event.message_id)
            .await
        {
            warn!(message = %event.message_id, error = %e, "Failed to delete help page");
        }
        store.remove(&key);
        return;
    }

    // Turned under the store lock, before any await.
    let pagination = Pagination::new(router.commands().len(), HELP_PAGE_SIZE);
    let Some(page) = store.update(&key, |p| *p = pagination.apply(*p, action)) else {
        return;
    };
    let (embed, _) = render_command_list(router, page);

    if let Err(e) = transport
        .edit_embed(&event.channel_id, &event.message_id, &embed)
        .await
    {
        warn!(message = %event.message_id, error = %e, "Failed to edit help page");
    }
    if let Err(e) = transport
        .remove_reaction(
            &event.channel_id,
            &event.message_id,
            &event.emoji,
            &event.user_id,
        )
        .await
    {
        warn!(message = %event.message_id, error = %e, "Failed to remove help reaction");
    }
}
