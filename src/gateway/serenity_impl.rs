//! [Gateway] backed by serenity's HTTP client and cache.

use std::sync::Arc;

use async_trait::async_trait;
use serenity::{
    Cache, ChannelId, EditRole, GetMessages, GuildId, Http, MessageId, PermissionOverwrite,
    PermissionOverwriteType, Permissions, RoleId, Timestamp, UserId,
};
use tracing::instrument;

use super::{Gateway, GatewayError, GuildSnapshot, MemberProfile};
use crate::serenity;

/// Everything a muted member loses in every channel.
const MUTE_DENY: Permissions = Permissions::SEND_MESSAGES
    .union(Permissions::SEND_MESSAGES_IN_THREADS)
    .union(Permissions::CREATE_PUBLIC_THREADS)
    .union(Permissions::ADD_REACTIONS)
    .union(Permissions::SPEAK);

/// Discord refuses to bulk delete messages older than two weeks.
const BULK_DELETE_MAX_AGE_SECS: i64 = 14 * 24 * 60 * 60;

/// Serenity's [Http] and [Cache], both are `Arc`s so this is cheap to clone.
#[derive(Clone)]
pub struct SerenityGateway {
    http: Arc<Http>,
    cache: Arc<Cache>,
}

impl SerenityGateway {
    pub fn new(ctx: &serenity::Context) -> Self {
        Self {
            http: ctx.http.clone(),
            cache: ctx.cache.clone(),
        }
    }

    fn cache_http(&self) -> (&Arc<Cache>, &Http) {
        (&self.cache, &self.http)
    }
}

#[async_trait]
impl Gateway for SerenityGateway {
    #[instrument(skip(self))]
    async fn kick(&self, guild: GuildId, user: UserId, reason: &str) -> Result<(), GatewayError> {
        guild.kick_with_reason(&self.http, user, reason).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn ban(&self, guild: GuildId, user: UserId, reason: &str) -> Result<(), GatewayError> {
        // Keep the member's message history.
        guild.ban_with_reason(&self.http, user, 0, reason).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn is_actionable(&self, guild: GuildId, user: UserId) -> Result<bool, GatewayError> {
        let partial = guild.to_partial_guild(self.cache_http()).await?;
        if partial.owner_id == user {
            return Ok(false);
        }

        let bot_id = self.cache.current_user().id;
        let bot = guild.member(self.cache_http(), bot_id).await?;
        let target = guild.member(self.cache_http(), user).await?;

        let top_position = |roles: &[RoleId]| {
            roles
                .iter()
                .filter_map(|id| partial.roles.get(id))
                .map(|role| role.position)
                .max()
                .unwrap_or(0)
        };

        Ok(top_position(&bot.roles) > top_position(&target.roles))
    }

    #[instrument(skip(self))]
    async fn find_role(&self, guild: GuildId, name: &str) -> Result<Option<RoleId>, GatewayError> {
        let roles = guild.roles(&self.http).await?;
        Ok(roles
            .values()
            .find(|role| role.name == name)
            .map(|role| role.id))
    }

    #[instrument(skip(self))]
    async fn create_mute_role(&self, guild: GuildId, name: &str) -> Result<RoleId, GatewayError> {
        let builder = EditRole::new().name(name).permissions(Permissions::empty());
        let role = guild.create_role(self.cache_http(), builder).await?;
        tracing::info!("Created '{name}' role in {guild}.");

        let overwrite = PermissionOverwrite {
            allow: Permissions::empty(),
            deny: MUTE_DENY,
            kind: PermissionOverwriteType::Role(role.id),
        };

        let channels = guild.channels(&self.http).await?;
        let results = futures::future::join_all(
            channels
                .keys()
                .map(|channel| channel.create_permission(&self.http, overwrite.clone())),
        )
        .await;

        // A channel we can't edit just means the role is leaky there.
        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            tracing::warn!(
                "Couldn't apply '{name}' overrides to {failed}/{} channels.",
                channels.len()
            );
        }

        Ok(role.id)
    }

    #[instrument(skip(self))]
    async fn has_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> Result<bool, GatewayError> {
        // Straight from http, the cache doesn't see role updates without the members intent.
        let member = self.http.get_member(guild, user).await?;
        Ok(member.roles.contains(&role))
    }

    #[instrument(skip(self))]
    async fn add_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
        reason: &str,
    ) -> Result<(), GatewayError> {
        self.http
            .add_member_role(guild, user, role, Some(reason))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn purge(&self, channel: ChannelId, limit: u8) -> Result<usize, GatewayError> {
        let messages = channel
            .messages(self.cache_http(), GetMessages::new().limit(limit))
            .await?;

        let cutoff = Timestamp::now().unix_timestamp() - BULK_DELETE_MAX_AGE_SECS;
        let ids: Vec<MessageId> = messages
            .iter()
            .map(|message| message.id)
            .filter(|id| id.created_at().unix_timestamp() > cutoff)
            .collect();

        match ids.as_slice() {
            [] => Ok(0),
            // Bulk delete needs at least two messages.
            [single] => {
                channel.delete_message(&self.http, *single).await?;
                Ok(1)
            }
            _ => {
                channel.delete_messages(&self.http, &ids).await?;
                Ok(ids.len())
            }
        }
    }

    #[instrument(skip(self, content))]
    async fn send(&self, channel: ChannelId, content: &str) -> Result<(), GatewayError> {
        channel.say(&self.http, content).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn guild_snapshot(&self, guild: GuildId) -> Result<GuildSnapshot, GatewayError> {
        let partial = guild.to_partial_guild_with_counts(&self.http).await?;
        let channels = guild.channels(&self.http).await?;

        Ok(GuildSnapshot {
            name: partial.name.clone(),
            owner: partial.owner_id,
            member_count: partial.approximate_member_count,
            channel_count: channels.len(),
            role_count: partial.roles.len(),
            created_at: guild.created_at(),
            icon_url: partial.icon_url(),
        })
    }

    #[instrument(skip(self))]
    async fn member_profile(
        &self,
        guild: Option<GuildId>,
        user: UserId,
    ) -> Result<MemberProfile, GatewayError> {
        let account = user.to_user(self.cache_http()).await?;

        let mut profile = MemberProfile {
            id: account.id,
            name: account.name.clone(),
            bot: account.bot,
            created_at: account.id.created_at(),
            joined_at: None,
            roles: Vec::new(),
            avatar_url: account.avatar_url(),
        };

        let Some(guild) = guild else {
            return Ok(profile);
        };

        // Not being a member isn't an error here, the user fields still stand.
        match guild.member(self.cache_http(), user).await {
            Ok(member) => {
                let all_roles = guild.roles(&self.http).await?;
                let mut roles: Vec<_> = member
                    .roles
                    .iter()
                    .filter_map(|id| all_roles.get(id))
                    .collect();
                roles.sort_by(|a, b| b.position.cmp(&a.position));

                profile.joined_at = member.joined_at;
                profile.roles = roles.into_iter().map(|role| role.name.clone()).collect();
            }
            Err(e) => tracing::debug!("{user} isn't a member of {guild}: {e}"),
        }

        Ok(profile)
    }
}
