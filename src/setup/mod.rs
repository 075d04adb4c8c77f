//! Builds the [serenity::Client] and everything it owns.

mod config;
mod framework;

use crate::data::Reminders;
use crate::serenity;
use crate::LampstandError;

pub use config::{Config, ScriptureConfig, WelcomeConfig};

/// Constructs a [serenity::Client] with the poise framework attached.
/// `reminders` is shared with the caller so it can be drained on shutdown.
pub(super) async fn client(
    config: Config,
    reminders: Reminders,
) -> Result<serenity::Client, LampstandError> {
    let token = config.token()?;

    // See https://discord.com/developers/docs/topics/gateway#gateway-intents
    let intents = intents(config.welcome().enabled);

    let client = serenity::ClientBuilder::new(token, intents)
        .framework(framework::framework(config, reminders))
        .await?;

    Ok(client)
}

/// Member joins are a privileged intent, only ask for them when greeting.
fn intents(welcome: bool) -> serenity::GatewayIntents {
    let intents = serenity::GatewayIntents::non_privileged();
    if welcome {
        intents | serenity::GatewayIntents::GUILD_MEMBERS
    } else {
        intents
    }
}
