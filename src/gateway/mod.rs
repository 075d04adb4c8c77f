//! The bot's view of Discord.
//!
//! [Gateway] is every side effect the router may perform on a guild. The
//! production implementation is [SerenityGateway]; tests swap in an in-memory
//! mock so moderation logic can be checked without a connection.

#[cfg(test)]
pub mod mock;
mod serenity_impl;

use async_trait::async_trait;
use thiserror::Error;

use crate::serenity;
use serenity::{ChannelId, GuildId, RoleId, Timestamp, UserId};

pub use serenity_impl::SerenityGateway;

/// A failed call to Discord.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Discord (or serenity) refused the request.
    #[error("Request rejected: {0}")]
    Rejected(#[from] serenity::Error),
    /// The request didn't finish in time.
    #[error("Request timed out")]
    Timeout,
    /// Something expected to exist (guild, member, role ...) doesn't.
    #[error("Missing {0}")]
    Missing(String),
}

/// Read-only counters for `/info server`.
#[derive(Debug, Clone)]
pub struct GuildSnapshot {
    pub name: String,
    pub owner: UserId,
    pub member_count: Option<u64>,
    pub channel_count: usize,
    pub role_count: usize,
    pub created_at: Timestamp,
    pub icon_url: Option<String>,
}

/// Read-only member information for `/info user`.
#[derive(Debug, Clone)]
pub struct MemberProfile {
    pub id: UserId,
    pub name: String,
    pub bot: bool,
    pub created_at: Timestamp,
    /// `None` outside a guild or when the user isn't a member.
    pub joined_at: Option<Timestamp>,
    /// Role names, highest first. Excludes `@everyone`.
    pub roles: Vec<String>,
    pub avatar_url: Option<String>,
}

/// Every Discord primitive the router needs.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Remove a member from the guild.
    async fn kick(&self, guild: GuildId, user: UserId, reason: &str) -> Result<(), GatewayError>;

    /// Remove and block a member from the guild.
    async fn ban(&self, guild: GuildId, user: UserId, reason: &str) -> Result<(), GatewayError>;

    /// Whether the bot outranks `user` (and `user` isn't the owner).
    async fn is_actionable(&self, guild: GuildId, user: UserId) -> Result<bool, GatewayError>;

    /// Find a role by exact name.
    async fn find_role(&self, guild: GuildId, name: &str) -> Result<Option<RoleId>, GatewayError>;

    /// Create the mute role and deny talking in every channel for it.
    async fn create_mute_role(&self, guild: GuildId, name: &str) -> Result<RoleId, GatewayError>;

    async fn has_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> Result<bool, GatewayError>;

    async fn add_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
        reason: &str,
    ) -> Result<(), GatewayError>;

    /// Delete up to `limit` of the most recent messages. Returns how many were deleted.
    async fn purge(&self, channel: ChannelId, limit: u8) -> Result<usize, GatewayError>;

    /// Post a plain message.
    async fn send(&self, channel: ChannelId, content: &str) -> Result<(), GatewayError>;

    async fn guild_snapshot(&self, guild: GuildId) -> Result<GuildSnapshot, GatewayError>;

    async fn member_profile(
        &self,
        guild: Option<GuildId>,
        user: UserId,
    ) -> Result<MemberProfile, GatewayError>;
}
