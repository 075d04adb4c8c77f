//! Logging functionality and error reporting.
//! The logging library of choice is [tracing].

use itertools::Itertools;
use poise::BoxFuture;
use poise::CreateReply;
use poise::FrameworkError;
use serenity::CreateMessage;
use tracing::debug;
use tracing::error;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

use crate::error::UserError;
use crate::serenity;
use crate::Config;
use crate::Context;
use crate::Data;
use crate::LampstandError;

/// The name of this crate, used to set filter target.
const THIS_CRATE: &str = env!("CARGO_CRATE_NAME");

/// Installs a console layer and, if enabled, an hourly rolling file layer.
/// Keep the returned guard alive or buffered file logs are lost.
pub(super) fn install_tracing(config: &Config) -> Option<WorkerGuard> {
    let debug = config.console_debug();
    let timer = fmt::time::ChronoLocal::rfc_3339();

    // INFO and above everywhere, plus DEBUG from this crate in debug mode.
    let mut target = Targets::new().with_default(LevelFilter::INFO);
    if debug {
        target = target.with_target(THIS_CRATE, LevelFilter::DEBUG);
    }

    let console_layer = fmt::layer()
        .with_ansi(true)
        .with_file(debug)
        .with_line_number(debug)
        .with_level(true)
        .with_target(true)
        .with_timer(timer.clone())
        .pretty()
        .with_filter(target.clone());

    // Files are named "{THIS_CRATE}.log.{TIMESTAMP}" inside `log_dir`.
    let (log_layer, guard) = if config.logs_enabled() {
        let appender = tracing_appender::rolling::hourly(config.log_dir(), format!("{THIS_CRATE}.log"));
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let layer = fmt::layer()
            .with_ansi(false)
            .with_file(debug)
            .with_line_number(debug)
            .with_level(true)
            .with_target(true)
            .with_timer(timer)
            .with_writer(writer)
            .compact()
            .with_filter(target);

        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(log_layer)
        .init();

    guard
}

/// Defines various behaviors for how to handle errors.
/// Triggers an [ephemeral_reply] on [LampstandError::UserError].
/// Triggers a [notify_bug] on unexpected errors.
pub fn handle_framework_error(err: FrameworkError<Data, LampstandError>) -> BoxFuture<()> {
    Box::pin(async move {
        match err {
            // ---
            // Invisible to users.
            // ---
            FrameworkError::Setup { error, .. } => error!("Error during startup: {error}"),
            FrameworkError::EventHandler { error, event, .. } => {
                error!("Error while handling {}: {error}", event.snake_case_name())
            }
            // Stale registrations of commands this bot no longer has.
            FrameworkError::UnknownInteraction { interaction, .. } => {
                let error = LampstandError::UnknownCommand {
                    name: interaction.data.name.clone(),
                };
                debug!("{error}")
            }

            // ---
            // The user did something wrong. They get told why, it's only logged at debug.
            // ---
            FrameworkError::Command {
                error: LampstandError::UserError(user_error),
                ctx,
                ..
            } => user_mistake(&ctx, user_error, None).await,
            FrameworkError::SubcommandRequired { ctx } => {
                let subcmds = ctx
                    .command()
                    .subcommands
                    .iter()
                    .map(|s| s.name.as_str())
                    .join(", ");
                user_mistake(&ctx, UserError::MissingSubcommand { subcmds }, None).await
            }
            FrameworkError::ArgumentParse {
                error, input, ctx, ..
            } => user_mistake(&ctx, UserError::BadArgs { input }, Some(error.to_string())).await,
            FrameworkError::CooldownHit {
                remaining_cooldown,
                ctx,
                ..
            } => user_mistake(&ctx, UserError::OnCooldown { remaining_cooldown }, None).await,
            FrameworkError::GuildOnly { ctx, .. } => {
                user_mistake(&ctx, UserError::GuildOnly, None).await
            }

            // ---
            // Bugs. Logged as error! and reported to the notify list.
            // ---
            FrameworkError::Command { error, ctx, .. } => {
                bug(&ctx, error, "Something went wrong... A bug report has been sent.").await
            }
            FrameworkError::CommandPanic { payload, ctx, .. } => {
                let error = LampstandError::Panic { payload };
                bug(&ctx, error, "Something went horribly wrong... A bug report has been sent.")
                    .await
            }
            FrameworkError::CommandStructureMismatch {
                description, ctx, ..
            } => {
                let error = LampstandError::CommandStructureMismatch {
                    description: description.to_string(),
                };
                bug(
                    &ctx.into(),
                    error,
                    "This command changed recently, try again in a minute.",
                )
                .await
            }

            // Permission checks, owner checks and prefixes aren't used by any command.
            other => error!("Unhandled framework error: {other}"),
        }
    })
}

/// Reply to a [UserError] without treating it as a bug.
async fn user_mistake(ctx: &Context<'_>, user_error: UserError, add_info: Option<String>) {
    Response::builder()
        .ctx(ctx)
        .reply(user_error.to_string())
        .source(user_error)
        .maybe_add_info(add_info)
        .build()
        .send()
        .await;
}

/// Log an unexpected error, notify the bug list and apologize to the user.
async fn bug(ctx: &Context<'_>, error: LampstandError, apology: &str) {
    Response::builder()
        .ctx(ctx)
        .reply(apology)
        .source(error)
        .notify(true)
        .is_error(true)
        .build()
        .send()
        .await;
}

/// Sends an ephemeral reply to the [Context] author.
async fn ephemeral_reply(ctx: &Context<'_>, content: impl Into<String>) {
    let reply = CreateReply::default().ephemeral(true).content(content);
    if let Err(e) = ctx.send(reply).await {
        error!("Failed to send ephemeral reply. {e}")
    };
}

/// Sends a notification (via private message) to everyone on the notify list.
/// If message fails, only log and don't retry.
async fn notify_bug(ctx: &Context<'_>, content: impl Into<String>) {
    let message = CreateMessage::new().content(content);

    let notify_list = &ctx.data().notify_list;
    for user in notify_list {
        if let Err(e) = user.direct_message(ctx, message.clone()).await {
            error!("Failed to send bug notification. {e}");
        }
    }
}

/// Helper function to create debug information from [Context]
fn debug_info(ctx: &Context) -> String {
    let user = &ctx.author().name;
    let cmd = &ctx.command().name;
    let user_input = ctx.invocation_string();
    format!("{user} tried to use {cmd} with {user_input}.")
}

/// Structured response to errors.
/// Always logs as at least [debug level](tracing::debug), but is upgraded to
/// [error level](tracing::error) if `error` is `Some(...)`.
/// Additionally, notify messages are accompanied by [debug info](debug_info).
#[derive(bon::Builder)]
#[builder(on(String, into))]
struct Response<'a> {
    /// The context of the response
    ctx: &'a Context<'a>,
    /// The reason for this reply, usually the error causing the response.
    #[builder(into)]
    source: LampstandError,
    /// Optional ephemeral reply to user.
    reply: Option<String>,
    /// Additional information to log
    add_info: Option<String>,
    /// Set to `true` to log as error.
    #[builder(default = false)]
    is_error: bool,
    /// Set to `true` to send notifications of the error.
    /// Does nothing if `is_error` is false.
    #[builder(default = false)]
    notify: bool,
}

impl Response<'_> {
    /// Execute the response
    async fn send(&self) {
        let ctx = self.ctx;

        let log_message = {
            let source = &self.source;
            let add_info = self
                .add_info
                .as_ref()
                // Map `None` to "" otherwise format it to be appended to another string.
                .map_or("".to_string(), |s| format!("| {s}"));
            format!("{source} {add_info}")
        };
        if self.is_error {
            error!("{log_message}");
            if self.notify {
                // Construct and send notification message

                let dbg_info = debug_info(ctx);
                // Format of message
                let content = format!("Debug Info: {dbg_info}\n{log_message}");
                notify_bug(ctx, content).await;
            }
        } else {
            debug!("{log_message}");
        }

        // Send ephemeral reply if there is one.
        if let Some(ref reply) = self.reply {
            ephemeral_reply(ctx, reply).await;
        }
    }
}
