//! Bot commands.
//!
//! Each slash command only parses its arguments into a [router::Command] and
//! hands it to [dispatch]. The behavior lives in [router].

mod info;
mod moderation;
mod ping;
mod remind;
mod verse;

use tracing::instrument;

use crate::data::GetData;
use crate::router::{self, Actor, Invocation};
use crate::serenity;
use crate::{Context, Data, LampstandError};

/// Convenient type alias for [poise::Command].
pub type Command = poise::Command<Data, LampstandError>;

/// Lists all the implemented commands
pub fn list() -> Vec<Command> {
    vec![
        ping::ping(),
        info::info(),
        moderation::kick(),
        moderation::ban(),
        moderation::mute(),
        moderation::purge(),
        remind::remind(),
        verse::verse(),
    ]
}

/// The invoking user, with the permissions Discord resolved for this channel.
async fn invoker(ctx: Context<'_>) -> Actor {
    let permissions = ctx
        .author_member()
        .await
        .and_then(|member| member.permissions)
        .unwrap_or_else(serenity::Permissions::empty);

    Actor::new(ctx.author(), permissions)
}

/// Run `command` through the router and send whatever it answers.
#[instrument(skip(ctx, command), fields(command = command.name()))]
async fn dispatch(ctx: Context<'_>, command: router::Command) -> Result<(), LampstandError> {
    let invocation = Invocation {
        command,
        actor: invoker(ctx).await,
        guild: ctx.guild_id(),
        channel: ctx.channel_id(),
    };

    let handling = router::handle(ctx.data(), ctx.gateway(), invocation);
    let response = router::defer_if_slow(handling, ctx.defer()).await??;
    if let router::Response::Scheduled { reminder, .. } = &response {
        tracing::info!("Scheduled reminder {reminder} for {}.", ctx.author().id);
    }

    ctx.send(response.reply().clone().into()).await?;
    Ok(())
}
