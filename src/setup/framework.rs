//! Setup for [poise::Framework]

use std::sync::Arc;

use crate::commands;
use crate::data::Reminders;
use crate::error::ConfigError;
use crate::events;
use crate::scripture::HttpScripture;
use crate::serenity;
use crate::Config;
use crate::Data;
use crate::LampstandError;

/// Convenient type alias, only this [poise::Framework] type is used.
type Framework = poise::Framework<Data, LampstandError>;

/// Construct a [poise::Framework]
pub(super) fn framework(config: Config, reminders: Reminders) -> Framework {
    poise::Framework::builder()
        .options(framework_options())
        .setup(|ctx, rdy, fw| framework_setup(ctx, rdy, fw, config, reminders))
        .build()
}

/// Configure options for the [Framework]
fn framework_options() -> poise::FrameworkOptions<Data, LampstandError> {
    poise::FrameworkOptions {
        commands: commands::list(),
        on_error: |e| crate::log::handle_framework_error(e),
        event_handler: |ctx, event, fw, data| Box::pin(events::handle(ctx, event, fw, data)),
        pre_command: |ctx| {
            Box::pin(async move {
                let cmd_name = &ctx.command().qualified_name;
                let user = &ctx.author().name;
                tracing::info!("Started '{cmd_name}' command from {user}.")
            })
        },
        post_command: |ctx| {
            Box::pin(async move {
                let cmd_name = &ctx.command().qualified_name;
                let user = &ctx.author().name;
                tracing::info!("Finished '{cmd_name}' command from {user}.")
            })
        },
        ..Default::default()
    }
}

/// Construct future that runs on startup
fn framework_setup<'a>(
    ctx: &'a serenity::Context,
    _rdy: &'a serenity::Ready,
    fw: &'a Framework,
    config: Config,
    reminders: Reminders,
) -> poise::BoxFuture<'a, Result<Data, LampstandError>> {
    Box::pin(async move {
        let commands = &commands::list();
        let app_commands = poise::builtins::create_application_commands(commands);

        serenity::Command::set_global_commands(&ctx, app_commands.clone()).await?;
        if let Some(dev_guild) = config.dev_guild() {
            // This is faster than global registers, useful for development.
            tracing::info!("Registering commands on dev guild.");
            dev_guild.set_commands(ctx, app_commands).await?;
        }

        let timeout = config.request_timeout();
        let scripture = HttpScripture::new(config.scripture(), timeout).map_err(|e| {
            ConfigError::InvalidConfig {
                reason: format!("scripture: {e}"),
            }
        })?;

        let data = Data::builder()
            .notify_list(config.notify_list(fw))
            .reminders(reminders)
            .scripture(Arc::new(scripture))
            .request_timeout(timeout)
            .welcome(config.welcome().clone())
            .build();

        Ok(data)
    })
}
