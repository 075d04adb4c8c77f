//! This module contains everything relating to [Data].

mod reminders;

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serenity::GuildId;
use serenity::RoleId;
use serenity::UserId;
use tokio::sync::Mutex;

use crate::gateway::{Gateway, SerenityGateway};
use crate::scripture::ScriptureSource;
use crate::serenity;
use crate::setup::WelcomeConfig;
use crate::Context;
pub use reminders::{ReminderId, Reminders};

/// Convenience type alias for [GuildData]
pub type GuildDataRef = Arc<Mutex<GuildData>>;

/// The data kept between shards, handed to every command.
#[derive(bon::Builder)]
pub struct Data {
    /// List of users to send bug notifications
    #[builder(default)]
    pub notify_list: HashSet<UserId>,
    /// Per-Guild data
    #[builder(default)]
    pub guild_data: Mutex<HashMap<GuildId, GuildDataRef>>,
    /// Reminders waiting to be delivered
    #[builder(default)]
    pub reminders: Reminders,
    /// Where verses come from
    pub scripture: Arc<dyn ScriptureSource>,
    /// Upper bound on every call to Discord or a verse API
    #[builder(default = Duration::from_secs(10))]
    pub request_timeout: Duration,
    /// Greeting for new members
    #[builder(default)]
    pub welcome: WelcomeConfig,
}

/// Data stored on a per-guild basis.
///
/// Locking it serializes work that must not interleave within a guild.
#[derive(Debug, Default)]
pub struct GuildData {
    /// The guild's mute role, once it has been found or created.
    pub mute_role: Option<RoleId>,
}

impl Data {
    /// Returns a reference to the [GuildData] of `guild`, creating it if needed.
    pub async fn guild_data(&self, guild: GuildId) -> GuildDataRef {
        let mut map = self.guild_data.lock().await;
        map.entry(guild).or_default().clone()
    }
}

/// Is able to get the bot's [Gateway].
pub trait GetData {
    /// Returns a [Gateway] that talks to Discord.
    fn gateway(&self) -> Arc<dyn Gateway>;
}

impl GetData for Context<'_> {
    fn gateway(&self) -> Arc<dyn Gateway> {
        // Http and Cache are both Arcs, so this is cheap
        Arc::new(SerenityGateway::new(self.serenity_context()))
    }
}
