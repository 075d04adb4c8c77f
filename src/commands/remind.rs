//! Implements the `/remind` command.

use crate::router::Command;
use crate::{Context, LampstandError};

/// Get a reminder in this channel later.
///
/// Reminders don't survive a restart.
#[poise::command(slash_command, user_cooldown = 5)]
pub async fn remind(
    ctx: Context<'_>,
    #[description = "Minutes from now (1-1440)"] minutes: u32,
    #[description = "What to remind you of"]
    #[max_length = 1000]
    message: String,
) -> Result<(), LampstandError> {
    super::dispatch(ctx, Command::Remind { minutes, message }).await
}
