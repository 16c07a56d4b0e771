//! Console Bot Example
//!
//! A demonstration of the Sigil dispatcher driven from the terminal. Every
//! line typed on stdin becomes a message in a single channel; everything the
//! bot sends is printed to stdout.
//!
//! # Commands
//!
//! ```text
//! !help [command [sub-command ...]]   paginated command list / details
//! !ping | !p                          health check
//! !echo <text>                        repeats the text
//! !roll [sides]                       rolls a die (default d6)
//! !config get | set <key> <value>     nested sub-commands
//! !tally                              per-user counter kept in an interaction store
//! @bot                                the ping shortcut
//! ```
//!
//! # Reactions
//!
//! Lines starting with `:` simulate reactions on a previously sent message:
//!
//! ```text
//! :react <message-id> <emoji>
//! :next <message-id>    :prev <message-id>    :close <message-id>
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package console-bot -- --prefix '!'
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use rand::Rng;
use sigil::framework::pagination::{CLOSE_EMOJI, NEXT_EMOJI, PREVIOUS_EMOJI};
use sigil::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const BOT_ID: &str = "sigil-bot";
const CHANNEL_ID: &str = "console";
const TALLY_STORE: &str = "tally";

#[derive(Debug, Parser)]
#[command(name = "console-bot", about = "Drive a Sigil router from the terminal")]
struct Args {
    /// Configuration file to load instead of searching the current directory.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Configuration profile (e.g. "dev").
    #[arg(long)]
    profile: Option<String>,

    /// Overrides the configured command prefixes.
    #[arg(long = "prefix")]
    prefixes: Vec<String>,

    /// Number of workers draining the job queue.
    #[arg(long)]
    workers: Option<usize>,

    /// The user id messages are attributed to.
    #[arg(long, default_value = "console-user")]
    user_id: String,

    /// The display name messages are attributed to.
    #[arg(long, default_value = "you")]
    user_name: String,
}

// ============================================================================
// Transport
// ============================================================================

/// Prints outbound calls to stdout and hands out `m<n>` message ids.
struct ConsoleTransport {
    next_id: AtomicU64,
}

impl ConsoleTransport {
    fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }

    fn next_message_id(&self) -> String {
        format!("m{}", self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

fn render_embed(embed: &Embed) -> String {
    let mut out = String::new();
    if let Some(title) = &embed.title {
        out.push_str(&format!("  ┃ {title}\n"));
    }
    if let Some(description) = &embed.description {
        for line in description.lines() {
            out.push_str(&format!("  ┃ {line}\n"));
        }
    }
    for field in &embed.fields {
        out.push_str(&format!("  ┃ [{}] {}\n", field.name, field.value));
    }
    out
}

#[async_trait]
impl Transport for ConsoleTransport {
    fn self_id(&self) -> &str {
        BOT_ID
    }

    async fn send_text(&self, channel_id: &str, content: &str) -> TransportResult<String> {
        let id = self.next_message_id();
        println!("#{channel_id} <{id}> bot: {content}");
        Ok(id)
    }

    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> TransportResult<String> {
        let id = self.next_message_id();
        print!("#{channel_id} <{id}> bot:\n{}", render_embed(embed));
        Ok(id)
    }

    async fn send_text_embed(
        &self,
        channel_id: &str,
        content: &str,
        embed: &Embed,
    ) -> TransportResult<String> {
        let id = self.next_message_id();
        print!("#{channel_id} <{id}> bot: {content}\n{}", render_embed(embed));
        Ok(id)
    }

    async fn edit_embed(
        &self,
        channel_id: &str,
        message_id: &str,
        embed: &Embed,
    ) -> TransportResult<()> {
        print!("#{channel_id} <{message_id}> (edited):\n{}", render_embed(embed));
        Ok(())
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> TransportResult<()> {
        println!("#{channel_id} <{message_id}> (deleted)");
        Ok(())
    }

    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> TransportResult<()> {
        debug!(channel_id, message_id, emoji, "Bot reacted");
        Ok(())
    }

    async fn remove_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
        user_id: &str,
    ) -> TransportResult<()> {
        debug!(channel_id, message_id, emoji, user_id, "Reaction removed");
        Ok(())
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn log_middleware(ctx: CommandContext) {
    let event = ctx.event();
    info!("[{}] {}: {}", event.channel_id, event.author.name, event.content);
}

async fn ping_handler(ctx: CommandContext) {
    if let Err(e) = ctx.respond_text("Pong!").await {
        error!("Failed to send ping response: {:?}", e);
    }
}

async fn echo_handler(ctx: CommandContext) {
    let text = ctx.args().raw();
    let reply = if text.is_empty() {
        "Nothing to echo.".to_string()
    } else {
        text.to_string()
    };

    if let Err(e) = ctx.respond_text(&reply).await {
        error!("Failed to send echo response: {:?}", e);
    }
}

async fn roll_handler(ctx: CommandContext) {
    let sides = match ctx.args().first() {
        None => 6,
        Some(arg) => match arg.as_i64() {
            Some(n) if n >= 2 => n as u64,
            _ => {
                let _ = ctx.respond_text("Usage: roll [sides >= 2]").await;
                return;
            }
        },
    };

    let value = rand::thread_rng().gen_range(1..=sides);

    if let Err(e) = ctx.respond_text(&format!("🎲 d{sides}: {value}")).await {
        error!("Failed to send roll response: {:?}", e);
    }
}

async fn config_handler(ctx: CommandContext) {
    let _ = ctx
        .respond_text("Try `config get` or `config set <key> <value>`.")
        .await;
}

async fn config_get_handler(ctx: CommandContext) {
    let router = ctx.router();
    let reply = format!(
        "prefixes: {:?}, workers: {}, bots allowed: {}",
        router.prefixes(),
        router.pool().size(),
        router.bots_allowed()
    );
    if let Err(e) = ctx.respond_text(&reply).await {
        error!("Failed to send config response: {:?}", e);
    }
}

async fn config_set_handler(ctx: CommandContext) {
    let args = ctx.args();
    let reply = match (args.get(0), args.get(1)) {
        (Some(key), Some(value)) => format!(
            "Would set `{}` to `{}` (the command tree is frozen at startup).",
            key.raw(),
            value.raw()
        ),
        _ => "Usage: config set <key> <value>".to_string(),
    };
    let _ = ctx.respond_text(&reply).await;
}

async fn tally_handler(ctx: CommandContext) {
    let Some(store) = ctx.router().interaction_stores().get::<u64>(TALLY_STORE) else {
        warn!("Tally store missing");
        return;
    };

    let count = store.upsert(&ctx.event().author.id, || 0, |n| *n += 1);

    let _ = ctx
        .respond_text(&format!("{} has tallied {count} time(s).", ctx.event().author.name))
        .await;
}

fn commands(builder: RouterBuilder) -> RouterBuilder {
    builder
        .middleware(log_middleware)
        .ping_handler(ping_handler)
        .interaction_store::<u64>(TALLY_STORE)
        .command(
            Command::new("ping")
                .alias("p")
                .description("Checks that the bot is alive")
                .usage("ping")
                .example("ping")
                .handler(ping_handler),
        )
        .command(
            Command::new("echo")
                .alias("say")
                .ignore_case(true)
                .description("Repeats what you say")
                .usage("echo <text>")
                .example("echo hello world")
                .handler(echo_handler),
        )
        .command(
            Command::new("roll")
                .description("Rolls a die")
                .usage("roll [sides]")
                .example("roll 20")
                .handler(roll_handler),
        )
        .command(
            Command::new("config")
                .alias("cfg")
                .ignore_case(true)
                .description("Shows or changes settings")
                .usage("config <get|set>")
                .example("config set prefix ?")
                .handler(config_handler)
                .sub_command(
                    Command::new("get")
                        .ignore_case(true)
                        .description("Shows the active settings")
                        .handler(config_get_handler),
                )
                .sub_command(
                    Command::new("set")
                        .ignore_case(true)
                        .description("Changes a setting")
                        .usage("config set <key> <value>")
                        .example("config set prefix ?")
                        .handler(config_set_handler),
                ),
        )
        .command(
            Command::new("tally")
                .description("Counts how often you ran it")
                .handler(tally_handler),
        )
}

// ============================================================================
// Input
// ============================================================================

/// Parses a `:`-prefixed control line into a reaction.
fn parse_reaction(line: &str, user_id: &str) -> Option<ReactionEvent> {
    let mut parts = line.trim_start_matches(':').split_whitespace();
    let verb = parts.next()?;
    let message_id = parts.next()?;
    let emoji = match verb {
        "react" => parts.next()?,
        "next" => NEXT_EMOJI,
        "prev" => PREVIOUS_EMOJI,
        "close" => CLOSE_EMOJI,
        _ => return None,
    };
    Some(ReactionEvent::new(CHANNEL_ID, message_id, user_id, emoji))
}

/// Forwards stdin lines as inbound events until EOF.
async fn read_stdin(tx: mpsc::Sender<InboundEvent>, author: Author) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut counter = 0u64;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let event: InboundEvent = if line.starts_with(':') {
            match parse_reaction(&line, &author.id) {
                Some(reaction) => reaction.into(),
                None => {
                    warn!("Unknown control line: {}", line);
                    continue;
                }
            }
        } else {
            counter += 1;
            let content = line.replace("@bot", &sigil::core::mention_of(BOT_ID));
            MessageEvent::new(format!("u{counter}"), CHANNEL_ID, author.clone(), content).into()
        };

        if tx.send(event).await.is_err() {
            break;
        }
    }
    debug!("stdin closed");
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = SigilRuntime::builder();
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = &args.profile {
        builder = builder.profile(profile.clone());
    }
    let runtime = builder.build()?;

    let transport: BoxedTransport = Arc::new(ConsoleTransport::new());
    let router = runtime.build_router(transport, |b| {
        let mut b = commands(b.default_help(true));
        if !args.prefixes.is_empty() {
            b = b.prefixes(args.prefixes.clone());
        }
        if let Some(workers) = args.workers {
            b = b.workers(workers);
        }
        b
    })?;

    info!(
        "Type a command, e.g. `{}help`. Ctrl+D to quit.",
        router.primary_prefix()
    );

    let (tx, rx) = inbound_channel(64);
    tokio::spawn(read_stdin(
        tx,
        Author::user(args.user_id.clone(), args.user_name.clone()),
    ));

    runtime.run(&router, rx).await?;

    Ok(())
}
