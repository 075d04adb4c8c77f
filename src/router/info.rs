//! Read-only commands: ping, server info and user info.

use std::time::Duration;

use itertools::Itertools;
use serenity::{GuildId, Timestamp, UserId};
use tracing::instrument;

use super::reply::{Field, Reply, INFO};
use super::{action_failed, bounded, Actor};
use crate::data::Data;
use crate::error::UserError;
use crate::gateway::{Gateway, MemberProfile};
use crate::serenity;

/// Longest role list shown before it's cut off.
const MAX_ROLES_SHOWN: usize = 20;

/// Discord's relative timestamp markup, rendered in the reader's locale.
fn relative(time: &Timestamp) -> String {
    format!("<t:{}:R>", time.unix_timestamp())
}

pub fn ping(latency: Duration) -> Reply {
    let value = if latency.is_zero() {
        // The shard hasn't completed a heartbeat yet.
        "measuring...".to_string()
    } else {
        format!("{} ms", latency.as_millis())
    };

    Reply::builder()
        .title("Pong!")
        .color(INFO)
        .fields(vec![Field::new("Gateway latency", value, true)])
        .build()
}

#[instrument(skip(data, gateway))]
pub async fn server(data: &Data, gateway: &dyn Gateway, guild: GuildId) -> Result<Reply, UserError> {
    let snapshot = bounded(data.request_timeout, gateway.guild_snapshot(guild))
        .await
        .map_err(action_failed("read this server's details"))?;

    let members = snapshot
        .member_count
        .map_or_else(|| "unknown".to_string(), |count| count.to_string());

    Ok(Reply::builder()
        .title(snapshot.name)
        .color(INFO)
        .maybe_thumbnail(snapshot.icon_url)
        .fields(vec![
            Field::new("Owner", format!("<@{}>", snapshot.owner), true),
            Field::new("Members", members, true),
            Field::new("Channels", snapshot.channel_count.to_string(), true),
            Field::new("Roles", snapshot.role_count.to_string(), true),
            Field::new("Created", relative(&snapshot.created_at), true),
        ])
        .footer(format!("ID: {guild}"))
        .build())
}

/// Show `target`, or the invoker when there's no target or it can't be found.
#[instrument(skip(data, gateway, actor))]
pub async fn user(
    data: &Data,
    gateway: &dyn Gateway,
    guild: Option<GuildId>,
    actor: &Actor,
    target: Option<UserId>,
) -> Result<Reply, UserError> {
    let lookup = |user: UserId| bounded(data.request_timeout, gateway.member_profile(guild, user));

    let profile = match target.filter(|id| *id != actor.id) {
        Some(target) => match lookup(target).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!("Couldn't find {target}, showing the invoker instead: {e}");
                lookup(actor.id)
                    .await
                    .map_err(action_failed("look up your profile"))?
            }
        },
        None => lookup(actor.id)
            .await
            .map_err(action_failed("look up your profile"))?,
    };

    Ok(profile_reply(profile))
}

fn profile_reply(profile: MemberProfile) -> Reply {
    let joined = profile
        .joined_at
        .as_ref()
        .map_or_else(|| "Not a member".to_string(), relative);

    let roles = if profile.roles.is_empty() {
        "None".to_string()
    } else {
        let mut shown = profile.roles.iter().take(MAX_ROLES_SHOWN).join(", ");
        if profile.roles.len() > MAX_ROLES_SHOWN {
            shown.push_str(&format!(" and {} more", profile.roles.len() - MAX_ROLES_SHOWN));
        }
        shown
    };

    let title = if profile.bot {
        format!("{} [bot]", profile.name)
    } else {
        profile.name
    };

    Reply::builder()
        .title(title)
        .color(INFO)
        .maybe_thumbnail(profile.avatar_url)
        .fields(vec![
            Field::new("ID", profile.id.to_string(), true),
            Field::new("Account created", relative(&profile.created_at), true),
            Field::new("Joined server", joined, true),
            Field::new("Roles", roles, false),
        ])
        .build()
}
