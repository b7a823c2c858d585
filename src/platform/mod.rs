//! Chat platform boundary
//!
//! The ticket workflow only needs a handful of platform capabilities:
//! resolving channels, roles and members, creating and deleting channels,
//! posting rich messages, and answering an inbound interaction exactly once.
//! [`ChatPlatform`] captures the outbound half; [`InteractionReply`] the
//! single-use reply to an inbound event.

#[cfg(any(test, feature = "testing"))]
pub mod testing;

use crate::error::{Result, TicketError};
use crate::types::{ChannelId, GuildId, RoleId, UserId};
use async_trait::async_trait;
use std::ops::BitOr;
use tokio::sync::oneshot;

/// Brand colour used for every embed
pub const EMBED_COLOR: u32 = 0x5865F2;

/// A resolved channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
}

/// A resolved role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

/// A user as seen in an interaction or member record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

impl User {
    /// Mention markup for this user
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

/// A guild membership record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user: User,
    pub roles: Vec<RoleId>,
}

/// Channel permission bits used by ticket channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permissions(pub u64);

impl Permissions {
    pub const NONE: Permissions = Permissions(0);
    pub const VIEW_CHANNEL: Permissions = Permissions(1 << 10);
    pub const SEND_MESSAGES: Permissions = Permissions(1 << 11);
    pub const READ_MESSAGE_HISTORY: Permissions = Permissions(1 << 16);

    /// View, send and read history: what a ticket participant gets
    pub fn participant() -> Self {
        Self::VIEW_CHANNEL | Self::SEND_MESSAGES | Self::READ_MESSAGE_HISTORY
    }

    pub fn contains(&self, other: Permissions) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(&self) -> u64 {
        self.0
    }
}

impl BitOr for Permissions {
    type Output = Permissions;

    fn bitor(self, rhs: Self) -> Self {
        Permissions(self.0 | rhs.0)
    }
}

/// Who an access-control entry applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    /// The default principal every guild member falls under
    Everyone,
    Member(UserId),
    Role(RoleId),
}

/// One access-control entry on a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionOverwrite {
    pub principal: Principal,
    pub allow: Permissions,
    pub deny: Permissions,
}

impl PermissionOverwrite {
    pub fn allow(principal: Principal, allow: Permissions) -> Self {
        Self {
            principal,
            allow,
            deny: Permissions::NONE,
        }
    }

    pub fn deny(principal: Principal, deny: Permissions) -> Self {
        Self {
            principal,
            allow: Permissions::NONE,
            deny,
        }
    }
}

/// Request to create a text channel under a parent category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    pub name: String,
    pub parent: ChannelId,
    pub overwrites: Vec<PermissionOverwrite>,
}

/// Embed block of a rich message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub footer: Option<String>,
}

/// One option of a select menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

/// Interactive control; each one is rendered in its own action row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    SelectMenu {
        custom_id: String,
        placeholder: String,
        options: Vec<SelectOption>,
    },
    Button {
        custom_id: String,
        label: String,
        style: ButtonStyle,
    },
}

/// A message posted to a channel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
    pub components: Vec<Component>,
}

/// Plain-text answer to an interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub content: String,
    pub ephemeral: bool,
}

impl Reply {
    /// Reply visible only to the user who triggered the interaction
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
        }
    }
}

/// Initial response to an inbound interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionResponse {
    /// Answer to a platform liveness ping
    Pong,
    /// Visible reply message
    Message(Reply),
    /// Acknowledge without posting anything
    DeferredUpdate,
}

/// A select-menu or button activation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentInteraction {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub user: User,
    /// Roles of the acting member at the time of the event
    pub member_roles: Vec<RoleId>,
    pub custom_id: String,
    /// Selected values; empty for buttons
    pub values: Vec<String>,
}

/// Single-use handle for answering an inbound interaction
///
/// The platform accepts exactly one initial response per interaction. The
/// sender half is consumed by the first reply, so a second reply fails with
/// [`TicketError::AlreadyReplied`] instead of reaching the platform.
#[derive(Debug)]
pub struct InteractionReply {
    sender: Option<oneshot::Sender<InteractionResponse>>,
}

impl InteractionReply {
    /// Create a reply handle and the receiver the transport answers from
    pub fn channel() -> (Self, oneshot::Receiver<InteractionResponse>) {
        let (tx, rx) = oneshot::channel();
        (Self { sender: Some(tx) }, rx)
    }

    pub fn has_replied(&self) -> bool {
        self.sender.is_none()
    }

    /// Send the initial response
    ///
    /// Fails with [`TicketError::ReplyUndeliverable`] when the transport is
    /// no longer waiting for it; the handle counts as used either way.
    pub fn send(&mut self, response: InteractionResponse) -> Result<()> {
        let sender = self.sender.take().ok_or(TicketError::AlreadyReplied)?;
        sender
            .send(response)
            .map_err(|_| TicketError::ReplyUndeliverable)
    }

    pub fn message(&mut self, reply: Reply) -> Result<()> {
        self.send(InteractionResponse::Message(reply))
    }
}

/// Outbound chat-platform capabilities used by the ticket workflow
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Whether the platform session is established and healthy
    fn is_online(&self) -> bool;

    async fn fetch_channel(&self, channel: ChannelId) -> Result<Channel>;

    async fn fetch_member(&self, guild: GuildId, user: UserId) -> Result<Member>;

    async fn fetch_role(&self, guild: GuildId, role: RoleId) -> Result<Role>;

    /// Create a text channel in `guild` as described by `spec`
    async fn create_channel(&self, guild: GuildId, spec: &ChannelSpec) -> Result<Channel>;

    async fn send_message(&self, channel: ChannelId, message: &OutgoingMessage) -> Result<()>;

    async fn set_topic(&self, channel: ChannelId, topic: &str) -> Result<()>;

    async fn delete_channel(&self, channel: ChannelId) -> Result<()>;
}
