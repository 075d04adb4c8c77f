//! In-memory [Gateway] for tests.

use std::collections::{HashMap, HashSet};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use async_trait::async_trait;

use super::{Gateway, GatewayError, GuildSnapshot, MemberProfile};
use crate::serenity::{ChannelId, GuildId, RoleId, Timestamp, UserId};

/// A side effect the router asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Kick(UserId),
    Ban(UserId),
    CreateRole(String),
    AddRole(UserId, RoleId),
    Purge(u8),
    Send(ChannelId, String),
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    roles: HashMap<String, RoleId>,
    member_roles: HashSet<(UserId, RoleId)>,
    protected: HashSet<UserId>,
}

/// Records every mutating call. Everyone is actionable unless [protect](MockGateway::protect)ed.
#[derive(Clone, Default)]
pub struct MockGateway {
    state: Arc<Mutex<State>>,
    next_role: Arc<AtomicU64>,
    /// Messages available to purge.
    backlog: Arc<AtomicU64>,
    reject_actions: bool,
    /// Slow down role creation to widen race windows.
    create_delay: Option<Duration>,
    /// Never answer, to trip the router's timeout.
    hang: bool,
}

impl MockGateway {
    pub fn new() -> Self {
        let gateway = Self::default();
        gateway.backlog.store(u64::MAX, Ordering::SeqCst);
        gateway
    }

    /// Every kick/ban/role call fails as if Discord said no.
    pub fn rejecting() -> Self {
        Self {
            reject_actions: true,
            ..Self::new()
        }
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::new()
        }
    }

    pub fn with_create_delay(delay: Duration) -> Self {
        Self {
            create_delay: Some(delay),
            ..Self::new()
        }
    }

    /// Only `count` messages exist in any channel.
    pub fn with_backlog(count: u64) -> Self {
        let gateway = Self::new();
        gateway.backlog.store(count, Ordering::SeqCst);
        gateway
    }

    /// Make `user` outrank the bot.
    pub fn protect(&self, user: UserId) {
        self.state.lock().unwrap().protected.insert(user);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn roles_created(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::CreateRole(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    async fn gate(&self) -> Result<(), GatewayError> {
        if self.hang {
            futures::future::pending::<()>().await;
        }
        if self.reject_actions {
            return Err(GatewayError::Missing("permission".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn kick(&self, _guild: GuildId, user: UserId, _reason: &str) -> Result<(), GatewayError> {
        self.gate().await?;
        self.record(Call::Kick(user));
        Ok(())
    }

    async fn ban(&self, _guild: GuildId, user: UserId, _reason: &str) -> Result<(), GatewayError> {
        self.gate().await?;
        self.record(Call::Ban(user));
        Ok(())
    }

    async fn is_actionable(&self, _guild: GuildId, user: UserId) -> Result<bool, GatewayError> {
        Ok(!self.state.lock().unwrap().protected.contains(&user))
    }

    async fn find_role(&self, _guild: GuildId, name: &str) -> Result<Option<RoleId>, GatewayError> {
        Ok(self.state.lock().unwrap().roles.get(name).copied())
    }

    async fn create_mute_role(&self, _guild: GuildId, name: &str) -> Result<RoleId, GatewayError> {
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        self.gate().await?;

        let id = RoleId::new(self.next_role.fetch_add(1, Ordering::SeqCst) + 1);
        let mut state = self.state.lock().unwrap();
        state.roles.insert(name.to_string(), id);
        state.calls.push(Call::CreateRole(name.to_string()));
        Ok(id)
    }

    async fn has_role(
        &self,
        _guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> Result<bool, GatewayError> {
        Ok(self.state.lock().unwrap().member_roles.contains(&(user, role)))
    }

    async fn add_role(
        &self,
        _guild: GuildId,
        user: UserId,
        role: RoleId,
        _reason: &str,
    ) -> Result<(), GatewayError> {
        self.gate().await?;
        let mut state = self.state.lock().unwrap();
        state.member_roles.insert((user, role));
        state.calls.push(Call::AddRole(user, role));
        Ok(())
    }

    async fn purge(&self, _channel: ChannelId, limit: u8) -> Result<usize, GatewayError> {
        self.gate().await?;
        let available = self.backlog.load(Ordering::SeqCst);
        let deleted = available.min(u64::from(limit));
        self.backlog.store(available - deleted, Ordering::SeqCst);
        self.record(Call::Purge(limit));
        Ok(deleted as usize)
    }

    async fn send(&self, channel: ChannelId, content: &str) -> Result<(), GatewayError> {
        self.record(Call::Send(channel, content.to_string()));
        Ok(())
    }

    async fn guild_snapshot(&self, _guild: GuildId) -> Result<GuildSnapshot, GatewayError> {
        self.gate().await?;
        Ok(GuildSnapshot {
            name: "Upper Room".to_string(),
            owner: UserId::new(1),
            member_count: Some(12),
            channel_count: 4,
            role_count: 3,
            created_at: Timestamp::now(),
            icon_url: None,
        })
    }

    async fn member_profile(
        &self,
        guild: Option<GuildId>,
        user: UserId,
    ) -> Result<MemberProfile, GatewayError> {
        self.gate().await?;
        Ok(MemberProfile {
            id: user,
            name: format!("user{user}"),
            bot: false,
            created_at: user.created_at(),
            joined_at: guild.map(|_| Timestamp::now()),
            roles: vec!["Deacon".to_string()],
            avatar_url: None,
        })
    }
}
