//! Implements the `/ping` command.

use crate::router::Command;
use crate::{Context, LampstandError};

/// Check that the bot is alive.
#[poise::command(slash_command, user_cooldown = 2)]
pub async fn ping(ctx: Context<'_>) -> Result<(), LampstandError> {
    let latency = ctx.ping().await;
    super::dispatch(ctx, Command::Ping { latency }).await
}
