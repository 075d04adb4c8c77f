//! Implements `/kick`, `/ban`, `/mute` and `/purge`.
//!
//! Permissions are checked by the router against the invoker, not by Discord,
//! so a denied attempt still gets a clear reply.

use crate::router::{Actor, Command};
use crate::serenity;
use crate::{Context, LampstandError};

/// Remove a member from this server.
#[poise::command(slash_command, guild_only)]
pub async fn kick(
    ctx: Context<'_>,
    #[description = "Member to kick"] member: serenity::User,
    #[description = "Recorded in the audit log"] reason: Option<String>,
) -> Result<(), LampstandError> {
    let target = Actor::target(&member);
    super::dispatch(ctx, Command::Kick { target, reason }).await
}

/// Remove a member and keep them from coming back.
#[poise::command(slash_command, guild_only)]
pub async fn ban(
    ctx: Context<'_>,
    #[description = "Member to ban"] member: serenity::User,
    #[description = "Recorded in the audit log"] reason: Option<String>,
) -> Result<(), LampstandError> {
    let target = Actor::target(&member);
    super::dispatch(ctx, Command::Ban { target, reason }).await
}

/// Stop a member from talking in any channel.
#[poise::command(slash_command, guild_only)]
pub async fn mute(
    ctx: Context<'_>,
    #[description = "Member to mute"] member: serenity::User,
    #[description = "Recorded in the audit log"] reason: Option<String>,
) -> Result<(), LampstandError> {
    let target = Actor::target(&member);
    super::dispatch(ctx, Command::Mute { target, reason }).await
}

/// Delete recent messages in this channel.
#[poise::command(slash_command, guild_only, channel_cooldown = 5)]
pub async fn purge(
    ctx: Context<'_>,
    #[description = "How many messages (1-100)"] count: u32,
) -> Result<(), LampstandError> {
    super::dispatch(ctx, Command::Purge { count }).await
}
