//! Implements `/info server` and `/info user`.

use crate::router::Command;
use crate::serenity;
use crate::{Context, LampstandError};

/// Show details about this server or a user.
#[poise::command(slash_command, subcommands("server", "user"), subcommand_required)]
pub async fn info(_ctx: Context<'_>) -> Result<(), LampstandError> {
    Ok(())
}

/// Show details about this server.
#[poise::command(slash_command, guild_only, guild_cooldown = 5)]
pub async fn server(ctx: Context<'_>) -> Result<(), LampstandError> {
    super::dispatch(ctx, Command::ServerInfo).await
}

/// Show details about a user, or yourself.
#[poise::command(slash_command, user_cooldown = 2)]
pub async fn user(
    ctx: Context<'_>,
    #[description = "Who to look up (defaults to you)"] target: Option<serenity::User>,
) -> Result<(), LampstandError> {
    let target = target.map(|user| user.id);
    super::dispatch(ctx, Command::UserInfo { target }).await
}
