//! Gateway events the bot reacts to outside of commands.

use serenity::{FullEvent, Member};
use tracing::instrument;

use crate::router::reply::{Reply, SUCCESS};
use crate::serenity;
use crate::setup::WelcomeConfig;
use crate::Data;
use crate::LampstandError;

/// Convenient type alias for the framework handle poise passes to events.
type FrameworkContext<'a> = poise::FrameworkContext<'a, Data, LampstandError>;

pub async fn handle(
    ctx: &serenity::Context,
    event: &FullEvent,
    _fw: FrameworkContext<'_>,
    data: &Data,
) -> Result<(), LampstandError> {
    match event {
        FullEvent::Ready { data_about_bot } => {
            let bot_name = &data_about_bot.user.name;
            let guilds = data_about_bot.guilds.len();
            tracing::info!("{bot_name} is ready! Connected to {guilds} guild(s).");
        }
        FullEvent::GuildMemberAddition { new_member } if data.welcome.enabled => {
            greet(ctx, new_member, &data.welcome).await?;
        }
        _ => {}
    }

    Ok(())
}

/// Post the welcome embed in the guild's system channel, if it has one.
#[instrument(skip_all, fields(guild = %member.guild_id, user = %member.user.id))]
async fn greet(
    ctx: &serenity::Context,
    member: &Member,
    welcome: &WelcomeConfig,
) -> Result<(), LampstandError> {
    // The cache guard can't be held across an await.
    let guild = ctx
        .cache
        .guild(member.guild_id)
        .map(|guild| (guild.name.clone(), guild.system_channel_id));

    let Some((server, Some(channel))) = guild else {
        tracing::debug!("No system channel to greet in.");
        return Ok(());
    };

    let mention = format!("<@{}>", member.user.id);
    let reply = welcome_reply(welcome, &mention, &server, member.face());
    channel.send_message(ctx, reply.into()).await?;

    tracing::info!("Welcomed {} to {server}.", member.user.name);
    Ok(())
}

fn welcome_reply(welcome: &WelcomeConfig, user: &str, server: &str, avatar: String) -> Reply {
    Reply::builder()
        .title("Welcome!")
        .color(SUCCESS)
        .description(welcome.render(user, server))
        .thumbnail(avatar)
        .build()
}
