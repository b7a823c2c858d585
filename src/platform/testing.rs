//! In-memory chat platform for tests and local dry runs
//!
//! Records every outbound call and lets a test inject failures or hold
//! channel creation open to observe in-flight state.

use super::{
    Channel, ChannelSpec, ChatPlatform, Member, OutgoingMessage, Role, User,
};
use crate::error::{PlatformErrorKind, Result, TicketError};
use crate::types::{ChannelId, GuildId, RoleId, UserId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

fn platform_error(kind: PlatformErrorKind) -> TicketError {
    match kind {
        PlatformErrorKind::MissingPermissions => {
            TicketError::platform(Some(50013), Some(403), "Missing Permissions")
        }
        PlatformErrorKind::NotFound => TicketError::platform(Some(10003), Some(404), "Unknown Channel"),
        PlatformErrorKind::Other => TicketError::platform(None, Some(500), "Internal Server Error"),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Everything the platform was asked to do
#[derive(Debug, Default, Clone)]
pub struct PlatformLog {
    pub created: Vec<(GuildId, ChannelSpec)>,
    pub messages: Vec<(ChannelId, OutgoingMessage)>,
    pub topics: Vec<(ChannelId, String)>,
    pub deleted: Vec<ChannelId>,
}

#[derive(Debug, Default)]
struct Failures {
    member: Option<PlatformErrorKind>,
    role: Option<PlatformErrorKind>,
    create: Option<PlatformErrorKind>,
    send: Option<PlatformErrorKind>,
    delete: Option<PlatformErrorKind>,
}

/// Gate that parks `create_channel` until released
#[derive(Debug, Default)]
struct CreateGate {
    entered: Notify,
    release: Notify,
}

/// Recording chat platform backed by in-memory maps
#[derive(Debug)]
pub struct InMemoryPlatform {
    online: AtomicBool,
    next_id: AtomicU64,
    channels: Mutex<HashMap<ChannelId, Channel>>,
    roles: Mutex<HashMap<RoleId, Role>>,
    members: Mutex<HashMap<UserId, Member>>,
    failures: Mutex<Failures>,
    gate: Mutex<Option<Arc<CreateGate>>>,
    log: Mutex<PlatformLog>,
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self {
            online: AtomicBool::new(true),
            next_id: AtomicU64::new(9_000_000),
            channels: Mutex::new(HashMap::new()),
            roles: Mutex::new(HashMap::new()),
            members: Mutex::new(HashMap::new()),
            failures: Mutex::new(Failures::default()),
            gate: Mutex::new(None),
            log: Mutex::new(PlatformLog::default()),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn add_channel(&self, id: ChannelId, name: &str) {
        lock(&self.channels).insert(
            id,
            Channel {
                id,
                name: name.to_string(),
            },
        );
    }

    pub fn add_role(&self, id: RoleId, name: &str) {
        lock(&self.roles).insert(
            id,
            Role {
                id,
                name: name.to_string(),
            },
        );
    }

    pub fn add_member(&self, id: UserId, username: &str, roles: Vec<RoleId>) {
        lock(&self.members).insert(
            id,
            Member {
                user: User {
                    id,
                    username: username.to_string(),
                },
                roles,
            },
        );
    }

    pub fn fail_member_lookup(&self, kind: PlatformErrorKind) {
        lock(&self.failures).member = Some(kind);
    }

    pub fn fail_role_lookup(&self, kind: PlatformErrorKind) {
        lock(&self.failures).role = Some(kind);
    }

    pub fn fail_channel_creation(&self, kind: PlatformErrorKind) {
        lock(&self.failures).create = Some(kind);
    }

    pub fn fail_messages(&self, kind: PlatformErrorKind) {
        lock(&self.failures).send = Some(kind);
    }

    pub fn fail_deletion(&self, kind: PlatformErrorKind) {
        lock(&self.failures).delete = Some(kind);
    }

    /// Park the next channel creations until [`Self::release_creation`]
    pub fn hold_channel_creation(&self) {
        *lock(&self.gate) = Some(Arc::new(CreateGate::default()));
    }

    /// Wait until a creation call is parked at the gate
    pub async fn creation_started(&self) {
        let gate = lock(&self.gate).clone();
        if let Some(gate) = gate {
            gate.entered.notified().await;
        }
    }

    /// Let the parked creation proceed and stop holding new ones
    pub fn release_creation(&self) {
        if let Some(gate) = lock(&self.gate).take() {
            gate.release.notify_one();
        }
    }

    pub fn log(&self) -> PlatformLog {
        lock(&self.log).clone()
    }

    pub fn channel_exists(&self, id: ChannelId) -> bool {
        lock(&self.channels).contains_key(&id)
    }
}

impl Default for InMemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatPlatform for InMemoryPlatform {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    async fn fetch_channel(&self, channel: ChannelId) -> Result<Channel> {
        lock(&self.channels)
            .get(&channel)
            .cloned()
            .ok_or_else(|| platform_error(PlatformErrorKind::NotFound))
    }

    async fn fetch_member(&self, _guild: GuildId, user: UserId) -> Result<Member> {
        if let Some(kind) = lock(&self.failures).member {
            return Err(platform_error(kind));
        }
        lock(&self.members)
            .get(&user)
            .cloned()
            .ok_or_else(|| TicketError::platform(Some(10007), Some(404), "Unknown Member"))
    }

    async fn fetch_role(&self, _guild: GuildId, role: RoleId) -> Result<Role> {
        if let Some(kind) = lock(&self.failures).role {
            return Err(platform_error(kind));
        }
        lock(&self.roles)
            .get(&role)
            .cloned()
            .ok_or_else(|| TicketError::platform(Some(10011), Some(404), "Unknown Role"))
    }

    async fn create_channel(&self, guild: GuildId, spec: &ChannelSpec) -> Result<Channel> {
        let gate = lock(&self.gate).clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        if let Some(kind) = lock(&self.failures).create {
            return Err(platform_error(kind));
        }

        let channel = Channel {
            id: ChannelId(self.next_id.fetch_add(1, Ordering::SeqCst)),
            name: spec.name.clone(),
        };
        lock(&self.channels).insert(channel.id, channel.clone());
        lock(&self.log).created.push((guild, spec.clone()));
        Ok(channel)
    }

    async fn send_message(&self, channel: ChannelId, message: &OutgoingMessage) -> Result<()> {
        if let Some(kind) = lock(&self.failures).send {
            return Err(platform_error(kind));
        }
        if !self.channel_exists(channel) {
            return Err(platform_error(PlatformErrorKind::NotFound));
        }
        lock(&self.log).messages.push((channel, message.clone()));
        Ok(())
    }

    async fn set_topic(&self, channel: ChannelId, topic: &str) -> Result<()> {
        if !self.channel_exists(channel) {
            return Err(platform_error(PlatformErrorKind::NotFound));
        }
        lock(&self.log).topics.push((channel, topic.to_string()));
        Ok(())
    }

    async fn delete_channel(&self, channel: ChannelId) -> Result<()> {
        if let Some(kind) = lock(&self.failures).delete {
            return Err(platform_error(kind));
        }
        if lock(&self.channels).remove(&channel).is_none() {
            return Err(platform_error(PlatformErrorKind::NotFound));
        }
        lock(&self.log).deleted.push(channel);
        Ok(())
    }
}
