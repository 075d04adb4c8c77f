//! Lampstand, a moderation and scripture bot for Discord.

mod commands;
mod data;
mod error;
mod events;
mod gateway;
mod lib;
mod log;
mod router;
mod scripture;
mod setup;

use poise::serenity_prelude as serenity;

use data::Reminders;
pub use data::Data;
pub use error::LampstandError;
pub use setup::Config;

/// Convenient type alias for the [poise::Context] every command receives.
pub type Context<'a> = poise::Context<'a, Data, LampstandError>;

#[tokio::main]
async fn main() {
    let config = match Config::read() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Dropping the guard flushes file logs, keep it for the whole run.
    let _guard = log::install_tracing(&config);

    if let Err(e) = run(config).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

/// Connects and runs until the client stops or Ctrl-C is pressed.
async fn run(config: Config) -> Result<(), LampstandError> {
    let reminders = Reminders::default();
    let mut client = setup::client(config, reminders.clone()).await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Couldn't listen for Ctrl-C: {e}");
            return;
        }
        tracing::info!("Shutting down...");
        shard_manager.shutdown_all().await;

        let lost = reminders.shutdown().await;
        if lost > 0 {
            tracing::warn!("Dropped {lost} pending reminder(s).");
        }
    });

    // Fails on a bad token, among other things.
    client.start().await?;
    Ok(())
}
