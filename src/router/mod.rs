//! Command dispatch.
//!
//! Slash commands parse their arguments into a [Command] and hand an
//! [Invocation] to [handle]. The router checks permissions, performs the side
//! effect through a [Gateway] and answers with a [Response]. Nothing here
//! knows about poise, so it can be driven by mocks.

mod info;
mod lookup;
mod moderation;
mod remind;
pub mod reply;

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serenity::{ChannelId, GuildId, Permissions, User, UserId};
use tracing::instrument;

use crate::data::{Data, ReminderId};
use crate::error::UserError;
use crate::gateway::{Gateway, GatewayError};
use crate::serenity;
pub use reply::Reply;

/// Someone who invokes commands, or is the target of one.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: UserId,
    pub name: String,
    /// Channel permissions as resolved by Discord. Empty for targets.
    pub permissions: Permissions,
}

impl Actor {
    pub fn new(user: &User, permissions: Permissions) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            permissions,
        }
    }

    /// A target only needs to be identified, its permissions don't matter.
    pub fn target(user: &User) -> Self {
        Self::new(user, Permissions::empty())
    }

    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }

    /// Whether this actor holds `permission`. Administrators hold everything.
    pub fn can(&self, permission: Permissions) -> bool {
        self.permissions.administrator() || self.permissions.contains(permission)
    }
}

/// A moderation side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModAction {
    Kick,
    Ban,
    Mute,
    Purge,
}

impl ModAction {
    /// The permission the invoker needs for this action.
    pub fn required_permission(self) -> Permissions {
        match self {
            ModAction::Kick => Permissions::KICK_MEMBERS,
            ModAction::Ban => Permissions::BAN_MEMBERS,
            ModAction::Mute => Permissions::MANAGE_ROLES,
            ModAction::Purge => Permissions::MANAGE_MESSAGES,
        }
    }
}

impl Display for ModAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verb = match self {
            ModAction::Kick => "kick",
            ModAction::Ban => "ban",
            ModAction::Mute => "mute",
            ModAction::Purge => "purge",
        };
        f.write_str(verb)
    }
}

/// Every command the bot understands, with its typed arguments.
#[derive(Debug, Clone)]
pub enum Command {
    Ping { latency: Duration },
    ServerInfo,
    UserInfo { target: Option<UserId> },
    Kick { target: Actor, reason: Option<String> },
    Ban { target: Actor, reason: Option<String> },
    Mute { target: Actor, reason: Option<String> },
    Purge { count: u32 },
    Remind { minutes: u32, message: String },
    Verse { reference: String },
    Search { term: String },
    Daily,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping { .. } => "ping",
            Command::ServerInfo => "info server",
            Command::UserInfo { .. } => "info user",
            Command::Kick { .. } => "kick",
            Command::Ban { .. } => "ban",
            Command::Mute { .. } => "mute",
            Command::Purge { .. } => "purge",
            Command::Remind { .. } => "remind",
            Command::Verse { .. } => "verse lookup",
            Command::Search { .. } => "verse search",
            Command::Daily => "verse daily",
        }
    }
}

/// A single command invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: Command,
    pub actor: Actor,
    /// `None` in direct messages.
    pub guild: Option<GuildId>,
    pub channel: ChannelId,
}

/// What to answer with.
#[derive(Debug, Clone)]
pub enum Response {
    /// Reply now, nothing follows.
    Reply(Reply),
    /// Acknowledge now, a follow-up is delivered later.
    Scheduled { ack: Reply, reminder: ReminderId },
}

impl Response {
    /// The reply to send immediately.
    pub fn reply(&self) -> &Reply {
        match self {
            Response::Reply(reply) => reply,
            Response::Scheduled { ack, .. } => ack,
        }
    }
}

impl From<Reply> for Response {
    fn from(reply: Reply) -> Self {
        Response::Reply(reply)
    }
}

/// Discord drops an interaction that gets no response within 3 seconds.
pub const DEFER_AFTER: Duration = Duration::from_millis(2500);

/// Await `handling`, running `defer` first if it takes longer than [DEFER_AFTER].
///
/// A deferred response fixes the visibility of whatever follows it, so quick
/// answers (errors included) are left to be sent as the first response.
pub async fn defer_if_slow<T, E>(
    handling: impl Future<Output = T>,
    defer: impl Future<Output = Result<(), E>>,
) -> Result<T, E> {
    let mut handling = std::pin::pin!(handling);
    match tokio::time::timeout(DEFER_AFTER, &mut handling).await {
        Ok(done) => Ok(done),
        Err(_) => {
            defer.await?;
            Ok(handling.await)
        }
    }
}

/// Dispatch `invocation` to its handler.
#[instrument(skip_all, fields(command = invocation.command.name(), actor = %invocation.actor.id))]
pub async fn handle(
    data: &Data,
    gateway: Arc<dyn Gateway>,
    invocation: Invocation,
) -> Result<Response, UserError> {
    let Invocation {
        command,
        actor,
        guild,
        channel,
    } = invocation;
    let gw = gateway.as_ref();

    let response: Response = match command {
        Command::Ping { latency } => info::ping(latency).into(),
        Command::ServerInfo => info::server(data, gw, in_guild(guild)?).await?.into(),
        Command::UserInfo { target } => info::user(data, gw, guild, &actor, target).await?.into(),
        Command::Kick { target, reason } => {
            moderation::kick(data, gw, in_guild(guild)?, &actor, &target, reason)
                .await?
                .into()
        }
        Command::Ban { target, reason } => {
            moderation::ban(data, gw, in_guild(guild)?, &actor, &target, reason)
                .await?
                .into()
        }
        Command::Mute { target, reason } => {
            moderation::mute(data, gw, in_guild(guild)?, &actor, &target, reason)
                .await?
                .into()
        }
        Command::Purge { count } => moderation::purge(data, gw, channel, &actor, count)
            .await?
            .into(),
        Command::Remind { minutes, message } => {
            remind::remind(data, gateway.clone(), channel, &actor, minutes, message).await?
        }
        Command::Verse { reference } => lookup::verse(data, &reference).await.into(),
        Command::Search { term } => lookup::search(data, &term).await.into(),
        Command::Daily => lookup::daily(data).await.into(),
    };

    Ok(response)
}

fn in_guild(guild: Option<GuildId>) -> Result<GuildId, UserError> {
    guild.ok_or(UserError::GuildOnly)
}

/// Run a gateway call under the request timeout.
async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, GatewayError>>,
) -> Result<T, GatewayError> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or_else(|_| Err(GatewayError::Timeout))
}

/// Log a failed gateway call and turn it into something the user can read.
fn action_failed(action: impl Into<String>) -> impl FnOnce(GatewayError) -> UserError {
    move |error| {
        let action = action.into();
        tracing::error!("Failed to {action}: {error}");
        UserError::ActionFailed { action }
    }
}
