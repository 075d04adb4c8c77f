//! Kick, ban, mute and purge.
//!
//! Checks run in a fixed order so the reported error is predictable when
//! several apply: self-target, then the invoker's permission, then whether the
//! target can be acted on. Nothing touches Discord before all of them pass.

use serenity::{ChannelId, GuildId};
use tracing::instrument;

use super::reply::{Field, Reply, SUCCESS};
use super::{action_failed, bounded, Actor, ModAction};
use crate::data::Data;
use crate::error::UserError;
use crate::gateway::Gateway;
use crate::serenity;

/// Name of the role given to muted members.
pub const MUTE_ROLE: &str = "Muted";

/// Purge bounds, as allowed by bulk delete.
pub const PURGE_MIN: u32 = 1;
pub const PURGE_MAX: u32 = 100;

const NO_REASON: &str = "No reason provided";

fn check_permission(actor: &Actor, action: ModAction) -> Result<(), UserError> {
    let missing = action.required_permission();
    if actor.can(missing) {
        Ok(())
    } else {
        Err(UserError::PermissionDenied { missing })
    }
}

fn reason_field(reason: Option<String>) -> Field {
    Field::new("Reason", reason.unwrap_or_else(|| NO_REASON.to_string()), false)
}

fn audit_reason(actor: &Actor, reason: Option<&str>) -> String {
    format!("{} (by {})", reason.unwrap_or(NO_REASON), actor.name)
}

#[instrument(skip_all, fields(target = %target.id))]
pub async fn kick(
    data: &Data,
    gateway: &dyn Gateway,
    guild: GuildId,
    actor: &Actor,
    target: &Actor,
    reason: Option<String>,
) -> Result<Reply, UserError> {
    remove(data, gateway, guild, actor, target, reason, ModAction::Kick).await
}

#[instrument(skip_all, fields(target = %target.id))]
pub async fn ban(
    data: &Data,
    gateway: &dyn Gateway,
    guild: GuildId,
    actor: &Actor,
    target: &Actor,
    reason: Option<String>,
) -> Result<Reply, UserError> {
    remove(data, gateway, guild, actor, target, reason, ModAction::Ban).await
}

/// Shared path for kick and ban, which differ only in the final call.
async fn remove(
    data: &Data,
    gateway: &dyn Gateway,
    guild: GuildId,
    actor: &Actor,
    target: &Actor,
    reason: Option<String>,
    action: ModAction,
) -> Result<Reply, UserError> {
    if actor.id == target.id {
        return Err(UserError::SelfTarget { action });
    }
    check_permission(actor, action)?;

    let actionable = bounded(data.request_timeout, gateway.is_actionable(guild, target.id))
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Couldn't tell whether {} is actionable: {e}", target.id);
            false
        });
    if !actionable {
        return Err(UserError::NotActionable {
            target: target.name.clone(),
            reason: "they own the server or have a role at or above mine".to_string(),
        });
    }

    let audit = audit_reason(actor, reason.as_deref());
    let call = match action {
        ModAction::Ban => gateway.ban(guild, target.id, &audit),
        _ => gateway.kick(guild, target.id, &audit),
    };
    bounded(data.request_timeout, call)
        .await
        .map_err(action_failed(format!("{action} {}", target.name)))?;

    tracing::info!("{} ran {action} on {} in {guild}", actor.id, target.id);

    let title = match action {
        ModAction::Ban => "Member banned",
        _ => "Member kicked",
    };
    Ok(Reply::builder()
        .title(title)
        .color(SUCCESS)
        .description(format!("{} was removed by {}.", target.mention(), actor.mention()))
        .fields(vec![reason_field(reason)])
        .build())
}

/// Give `target` the mute role, creating it first if the guild has none.
#[instrument(skip_all, fields(target = %target.id))]
pub async fn mute(
    data: &Data,
    gateway: &dyn Gateway,
    guild: GuildId,
    actor: &Actor,
    target: &Actor,
    reason: Option<String>,
) -> Result<Reply, UserError> {
    check_permission(actor, ModAction::Mute)?;

    // Held until the role is assigned, so concurrent mutes can't both create it.
    let guild_data = data.guild_data(guild).await;
    let mut guild_data = guild_data.lock().await;
    let timeout = data.request_timeout;

    let role = match guild_data.mute_role {
        Some(role) => role,
        None => {
            let found = bounded(timeout, gateway.find_role(guild, MUTE_ROLE))
                .await
                .map_err(action_failed("look up the mute role"))?;
            let role = match found {
                Some(role) => role,
                None => bounded(timeout, gateway.create_mute_role(guild, MUTE_ROLE))
                    .await
                    .map_err(action_failed("create the mute role"))?,
            };
            guild_data.mute_role = Some(role);
            role
        }
    };

    let muted = bounded(timeout, gateway.has_role(guild, target.id, role))
        .await
        .map_err(action_failed(format!("check {}'s roles", target.name)))?;
    if muted {
        return Err(UserError::NotActionable {
            target: target.name.clone(),
            reason: "already muted".to_string(),
        });
    }

    let audit = audit_reason(actor, reason.as_deref());
    if let Err(e) = bounded(timeout, gateway.add_role(guild, target.id, role, &audit)).await {
        // The cached role may have been deleted, look it up again next time.
        guild_data.mute_role = None;
        return Err(action_failed(format!("mute {}", target.name))(e));
    }

    tracing::info!("{} muted {} in {guild}", actor.id, target.id);

    Ok(Reply::builder()
        .title("Member muted")
        .color(SUCCESS)
        .description(format!("{} was muted by {}.", target.mention(), actor.mention()))
        .fields(vec![reason_field(reason)])
        .build())
}

/// Delete up to `count` recent messages in `channel`.
#[instrument(skip_all, fields(count))]
pub async fn purge(
    data: &Data,
    gateway: &dyn Gateway,
    channel: ChannelId,
    actor: &Actor,
    count: u32,
) -> Result<Reply, UserError> {
    if !(PURGE_MIN..=PURGE_MAX).contains(&count) {
        return Err(UserError::Validation {
            argument: "count",
            min: PURGE_MIN,
            max: PURGE_MAX,
            given: count,
        });
    }
    check_permission(actor, ModAction::Purge)?;

    // In range, so this fits.
    let limit = count as u8;
    let deleted = bounded(data.request_timeout, gateway.purge(channel, limit))
        .await
        .map_err(action_failed("delete messages"))?;

    if deleted < count as usize {
        tracing::debug!("Purge in {channel} asked for {count}, deleted {deleted}");
    }

    let plural = if deleted == 1 { "" } else { "s" };
    Ok(Reply::builder()
        .title("Messages purged")
        .color(SUCCESS)
        .description(format!("Deleted {deleted} message{plural}."))
        .ephemeral(true)
        .build())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serenity::Permissions;

    use super::*;
    use crate::gateway::mock::{Call, MockGateway};
    use crate::router::test_support::*;
    use crate::router::{Command, Response};

    fn kick_cmd(target: Actor) -> Command {
        Command::Kick {
            target,
            reason: Some("spam".to_string()),
        }
    }

    fn mute_cmd(target: Actor) -> Command {
        Command::Mute {
            target,
            reason: None,
        }
    }

    #[tokio::test]
    async fn missing_permission_changes_nothing() {
        let data = data();
        let gateway = MockGateway::new();
        let target = actor(30, Permissions::empty());

        let commands = [
            kick_cmd(target.clone()),
            Command::Ban {
                target: target.clone(),
                reason: None,
            },
            mute_cmd(target),
            Command::Purge { count: 10 },
        ];
        for command in commands {
            let result = run(&data, &gateway, member(), command).await;
            assert!(matches!(result, Err(UserError::PermissionDenied { .. })));
        }

        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn self_target_is_reported_before_permissions() {
        let data = data();
        let gateway = MockGateway::new();

        let result = run(&data, &gateway, member(), kick_cmd(member())).await;
        assert!(matches!(
            result,
            Err(UserError::SelfTarget {
                action: ModAction::Kick
            })
        ));

        let result = run(
            &data,
            &gateway,
            moderator(),
            Command::Ban {
                target: moderator(),
                reason: None,
            },
        )
        .await;
        assert!(matches!(
            result,
            Err(UserError::SelfTarget {
                action: ModAction::Ban
            })
        ));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn kick_removes_target() {
        let data = data();
        let gateway = MockGateway::new();
        let target = actor(30, Permissions::empty());

        let response = run(&data, &gateway, moderator(), kick_cmd(target.clone()))
            .await
            .unwrap();

        assert_eq!(gateway.calls(), vec![Call::Kick(target.id)]);
        let reply = response.reply();
        assert_eq!(reply.title, "Member kicked");
        assert!(reply.fields.iter().any(|f| f.value == "spam"));
    }

    #[tokio::test]
    async fn outranked_target_is_not_actionable() {
        let data = data();
        let gateway = MockGateway::new();
        let target = actor(30, Permissions::empty());
        gateway.protect(target.id);

        let result = run(&data, &gateway, moderator(), kick_cmd(target)).await;
        assert!(matches!(result, Err(UserError::NotActionable { .. })));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn rejected_ban_is_action_failed() {
        let data = data();
        let gateway = MockGateway::rejecting();
        let command = Command::Ban {
            target: actor(30, Permissions::empty()),
            reason: None,
        };

        let result = run(&data, &gateway, moderator(), command).await;
        assert!(matches!(result, Err(UserError::ActionFailed { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_gateway_times_out() {
        let data = data();
        let gateway = MockGateway::hanging();

        let result = run(&data, &gateway, moderator(), Command::Purge { count: 5 }).await;
        assert!(matches!(result, Err(UserError::ActionFailed { .. })));
    }

    #[tokio::test]
    async fn muting_twice_reports_already_muted() {
        let data = data();
        let gateway = MockGateway::new();
        let target = actor(30, Permissions::empty());

        run(&data, &gateway, moderator(), mute_cmd(target.clone()))
            .await
            .unwrap();
        let second = run(&data, &gateway, moderator(), mute_cmd(target)).await;

        match second {
            Err(UserError::NotActionable { reason, .. }) => assert_eq!(reason, "already muted"),
            other => panic!("expected already muted, got {other:?}"),
        }
        assert_eq!(gateway.roles_created(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_mutes_create_one_role() {
        let data = Arc::new(data());
        let gateway = MockGateway::with_create_delay(Duration::from_secs(1));

        let (a, b) = tokio::join!(
            run(&data, &gateway, moderator(), mute_cmd(actor(30, Permissions::empty()))),
            run(&data, &gateway, moderator(), mute_cmd(actor(31, Permissions::empty()))),
        );

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(gateway.roles_created(), 1);
    }

    #[tokio::test]
    async fn failed_role_creation_is_action_failed() {
        let data = data();
        let gateway = MockGateway::rejecting();

        let result = run(
            &data,
            &gateway,
            moderator(),
            mute_cmd(actor(30, Permissions::empty())),
        )
        .await;

        assert!(matches!(result, Err(UserError::ActionFailed { .. })));
        assert_eq!(data.guild_data(GUILD).await.lock().await.mute_role, None);
    }

    #[tokio::test]
    async fn purge_count_is_validated_first() {
        let data = data();
        let gateway = MockGateway::new();

        for count in [0, 101] {
            // Even a member without the permission gets the range error.
            let result = run(&data, &gateway, member(), Command::Purge { count }).await;
            assert!(matches!(
                result,
                Err(UserError::Validation { given, .. }) if given == count
            ));
        }
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn purge_reports_actual_count() {
        let data = data();
        let gateway = MockGateway::with_backlog(20);

        let response = run(&data, &gateway, moderator(), Command::Purge { count: 50 })
            .await
            .unwrap();

        assert_eq!(gateway.calls(), vec![Call::Purge(50)]);
        let Response::Reply(reply) = response else {
            panic!("purge doesn't schedule anything");
        };
        assert_eq!(reply.description.as_deref(), Some("Deleted 20 messages."));
        assert!(reply.ephemeral);
    }
}
