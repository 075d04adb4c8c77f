//! Implements `/verse lookup`, `/verse search` and `/verse daily`.

use crate::router::Command;
use crate::{Context, LampstandError};

/// Read scripture.
#[poise::command(
    slash_command,
    subcommands("lookup", "search", "daily"),
    subcommand_required
)]
pub async fn verse(_ctx: Context<'_>) -> Result<(), LampstandError> {
    Ok(())
}

/// Look up a passage by reference.
#[poise::command(slash_command, user_cooldown = 3)]
pub async fn lookup(
    ctx: Context<'_>,
    #[description = "e.g. John 3:16 or Psalm 23:1-3"] reference: String,
) -> Result<(), LampstandError> {
    super::dispatch(ctx, Command::Verse { reference }).await
}

/// Search verses for a word or phrase.
#[poise::command(slash_command, user_cooldown = 3)]
pub async fn search(
    ctx: Context<'_>,
    #[description = "Word or phrase"] term: String,
) -> Result<(), LampstandError> {
    super::dispatch(ctx, Command::Search { term }).await
}

/// A random verse.
#[poise::command(slash_command, user_cooldown = 3)]
pub async fn daily(ctx: Context<'_>) -> Result<(), LampstandError> {
    super::dispatch(ctx, Command::Daily).await
}
