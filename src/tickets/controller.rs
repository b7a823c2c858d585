//! Ticket lifecycle controller
//!
//! Creation runs per (requester, category) key:
//!
//! ```text
//! Idle -> Locked -> Provisioning -> Created
//!           \-> Failed -> Idle
//! ```
//!
//! and an existing ticket channel goes `Open -> Closing -> Deleted`.
//!
//! The key is held by a [`CreationGuard`] for the whole creation sequence,
//! so a second event for the same key is refused rather than queued, and
//! every exit path releases it. Each inbound event gets at most one initial
//! reply through its [`InteractionReply`].

use super::content::{self, CLOSE_BUTTON_ID};
use super::lock::{CreationGuard, CreationLocks};
use crate::error::{PlatformErrorKind, TicketError};
use crate::panel::CATEGORY_SELECT_ID;
use crate::platform::{
    ChatPlatform, ComponentInteraction, InteractionReply, InteractionResponse, Member, Reply,
    Role,
};
use crate::rules::RuleStore;
use crate::types::{Category, ChannelId, RoleId, TicketKey};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Identifiers the controller needs from configuration
#[derive(Debug, Clone, Copy)]
pub struct TicketSettings {
    /// Parent category new ticket channels are created under
    pub parent_category: ChannelId,
    /// Staff role granted access to tickets and allowed to close them
    pub support_role: RoleId,
}

/// Why a creation attempt ended without a confirmed ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationFailure {
    UnknownCategory,
    MemberUnavailable,
    SupportRoleUnavailable,
    Platform(PlatformErrorKind),
    /// Channel exists but the requester was never told about it
    ReplyUndelivered(ChannelId),
}

/// Result of a category selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationOutcome {
    Created(ChannelId),
    AlreadyInProgress,
    Failed(CreationFailure),
}

/// Result of a close activation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed,
    Denied,
    /// Acknowledged, but the platform refused the deletion
    DeleteFailed,
    /// The acknowledgement could not be delivered; nothing was deleted
    Unacknowledged,
}

/// Result of routing a component interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentOutcome {
    Creation(CreationOutcome),
    Close(CloseOutcome),
    Ignored,
}

/// Drives ticket creation and closing
pub struct TicketController {
    platform: Arc<dyn ChatPlatform>,
    rules: Arc<RuleStore>,
    settings: TicketSettings,
    locks: CreationLocks,
}

impl TicketController {
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        rules: Arc<RuleStore>,
        settings: TicketSettings,
    ) -> Self {
        Self {
            platform,
            rules,
            settings,
            locks: CreationLocks::new(),
        }
    }

    /// In-flight creation keys
    pub fn locks(&self) -> &CreationLocks {
        &self.locks
    }

    /// Route a component interaction by its custom id
    pub async fn handle_component(
        &self,
        interaction: &ComponentInteraction,
        reply: &mut InteractionReply,
    ) -> ComponentOutcome {
        match interaction.custom_id.as_str() {
            CATEGORY_SELECT_ID => {
                ComponentOutcome::Creation(self.handle_category_select(interaction, reply).await)
            }
            CLOSE_BUTTON_ID => ComponentOutcome::Close(self.handle_close(interaction, reply).await),
            other => {
                debug!("Ignoring component interaction {:?}", other);
                respond(reply, InteractionResponse::DeferredUpdate);
                ComponentOutcome::Ignored
            }
        }
    }

    /// Creation transition, triggered by a category selection
    pub async fn handle_category_select(
        &self,
        interaction: &ComponentInteraction,
        reply: &mut InteractionReply,
    ) -> CreationOutcome {
        let Some(category) = interaction
            .values
            .first()
            .and_then(|value| Category::from_value(value))
        else {
            warn!(
                "Unknown ticket category {:?} from {}",
                interaction.values, interaction.user.id
            );
            say(reply, content::REPLY_GENERIC_FAILURE);
            return CreationOutcome::Failed(CreationFailure::UnknownCategory);
        };

        let key = TicketKey::new(interaction.user.id, category);
        let Some(guard) = self.locks.try_acquire(key) else {
            debug!("Ticket creation for {} already in progress", key);
            say(reply, content::REPLY_IN_PROGRESS);
            return CreationOutcome::AlreadyInProgress;
        };

        // The guard lives until this call returns, whichever way it returns.
        self.create_ticket(&guard, interaction, reply).await
    }

    async fn create_ticket(
        &self,
        guard: &CreationGuard,
        interaction: &ComponentInteraction,
        reply: &mut InteractionReply,
    ) -> CreationOutcome {
        let category = guard.key().category;

        let member = match self
            .platform
            .fetch_member(interaction.guild_id, interaction.user.id)
            .await
        {
            Ok(member) => member,
            Err(e) => {
                warn!("Could not load member {}: {}", interaction.user.id, e);
                say(reply, content::REPLY_MEMBER_UNAVAILABLE);
                return CreationOutcome::Failed(CreationFailure::MemberUnavailable);
            }
        };

        let support_role = match self
            .platform
            .fetch_role(interaction.guild_id, self.settings.support_role)
            .await
        {
            Ok(role) => role,
            Err(e) => {
                error!(
                    "Support role {} could not be resolved: {}",
                    self.settings.support_role, e
                );
                say(reply, content::REPLY_ROLE_MISCONFIGURED);
                return CreationOutcome::Failed(CreationFailure::SupportRoleUnavailable);
            }
        };

        let spec = content::channel_spec(
            &member.user,
            support_role.id,
            category,
            self.settings.parent_category,
        );
        let channel = match self
            .platform
            .create_channel(interaction.guild_id, &spec)
            .await
        {
            Ok(channel) => channel,
            Err(e) => {
                error!("Failed to create ticket channel {:?}: {}", spec.name, e);
                let kind = e.platform_kind();
                if !reply.has_replied() {
                    say(reply, creation_failure_reply(kind));
                }
                return CreationOutcome::Failed(CreationFailure::Platform(kind));
            }
        };

        if let Err(e) = reply.message(Reply::ephemeral(content::reply_created(channel.id))) {
            error!(
                "Ticket channel {} ({}) was created for {} but the confirmation could not be delivered: {}",
                channel.name, channel.id, member.user.id, e
            );
            return CreationOutcome::Failed(CreationFailure::ReplyUndelivered(channel.id));
        }

        info!(
            "Created ticket channel {} ({}) for {} in {}",
            channel.name, channel.id, member.user.id, category
        );

        if let Err(e) = self.open_ticket(channel.id, &member, &support_role, category).await {
            error!("Failed to finish setting up ticket {}: {}", channel.id, e);
        }

        CreationOutcome::Created(channel.id)
    }

    /// Post the welcome message, then link the channel to its requester
    async fn open_ticket(
        &self,
        channel: ChannelId,
        member: &Member,
        support_role: &Role,
        category: Category,
    ) -> crate::Result<()> {
        let rules = self.rules.load().await;
        let welcome = content::welcome_message(&member.user, support_role.id, category, &rules);
        self.platform.send_message(channel, &welcome).await?;
        self.platform
            .set_topic(channel, &member.user.id.to_string())
            .await?;
        Ok(())
    }

    /// Close transition, triggered by the close button
    ///
    /// Closing is best effort: the acknowledgement goes out first, and a
    /// failed deletion is only logged.
    pub async fn handle_close(
        &self,
        interaction: &ComponentInteraction,
        reply: &mut InteractionReply,
    ) -> CloseOutcome {
        if !interaction.member_roles.contains(&self.settings.support_role) {
            debug!(
                "{} tried to close {} without the support role",
                interaction.user.id, interaction.channel_id
            );
            say(reply, content::REPLY_CLOSE_DENIED);
            return CloseOutcome::Denied;
        }

        if let Err(e) = reply.message(Reply::ephemeral(content::REPLY_CLOSING)) {
            warn!(
                "Close of {} not acknowledged, leaving channel open: {}",
                interaction.channel_id, e
            );
            return CloseOutcome::Unacknowledged;
        }

        match self.platform.delete_channel(interaction.channel_id).await {
            Ok(()) => {
                info!(
                    "Ticket channel {} closed by {}",
                    interaction.channel_id, interaction.user.id
                );
                CloseOutcome::Closed
            }
            Err(e) => {
                error!(
                    "Failed to delete ticket channel {}: {}",
                    interaction.channel_id, e
                );
                CloseOutcome::DeleteFailed
            }
        }
    }
}

fn creation_failure_reply(kind: PlatformErrorKind) -> &'static str {
    match kind {
        PlatformErrorKind::MissingPermissions => content::REPLY_NO_PERMISSION,
        PlatformErrorKind::NotFound => content::REPLY_PARENT_NOT_FOUND,
        PlatformErrorKind::Other => content::REPLY_GENERIC_FAILURE,
    }
}

/// Send an ephemeral notice; a failed notice changes nothing but is logged
fn say(reply: &mut InteractionReply, text: &str) {
    respond(reply, InteractionResponse::Message(Reply::ephemeral(text)));
}

fn respond(reply: &mut InteractionReply, response: InteractionResponse) {
    match reply.send(response) {
        Ok(()) => {}
        Err(TicketError::AlreadyReplied) => warn!("Interaction already replied to, dropping response"),
        Err(e) => warn!("Failed to reply to interaction: {}", e),
    }
}
