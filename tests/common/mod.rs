//! Common test utilities and helpers

#![allow(dead_code)]

use std::sync::Arc;
use tempfile::TempDir;
use ticketdesk_core::panel::CATEGORY_SELECT_ID;
use ticketdesk_core::platform::testing::InMemoryPlatform;
use ticketdesk_core::platform::{ComponentInteraction, User};
use ticketdesk_core::tickets::CLOSE_BUTTON_ID;
use ticketdesk_core::types::{ChannelId, GuildId, RoleId, UserId};
use ticketdesk_core::{PanelRenderer, RuleStore, TicketController, TicketSettings};

pub const GUILD: GuildId = GuildId(1000);
pub const PANEL_CHANNEL: ChannelId = ChannelId(1001);
pub const PARENT_CATEGORY: ChannelId = ChannelId(1002);
pub const SUPPORT_ROLE: RoleId = RoleId(1003);
pub const REQUESTER: UserId = UserId(2000);
pub const STAFF: UserId = UserId(2001);

/// Controller, panel and rule store wired to an in-memory platform
pub struct TestDesk {
    _dir: TempDir,
    pub platform: Arc<InMemoryPlatform>,
    pub rules: Arc<RuleStore>,
    pub panel: PanelRenderer,
    pub controller: TicketController,
}

impl TestDesk {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let rules = Arc::new(RuleStore::new(dir.path().join("ticketRules.json")));

        let platform = Arc::new(InMemoryPlatform::new());
        platform.add_channel(PANEL_CHANNEL, "abrir-ticket");
        platform.add_role(SUPPORT_ROLE, "Suporte");
        platform.add_member(REQUESTER, "maria", vec![]);
        platform.add_member(STAFF, "joao", vec![SUPPORT_ROLE]);

        let panel = PanelRenderer::new(platform.clone(), rules.clone(), PANEL_CHANNEL);
        let controller = TicketController::new(
            platform.clone(),
            rules.clone(),
            TicketSettings {
                parent_category: PARENT_CATEGORY,
                support_role: SUPPORT_ROLE,
            },
        );

        Self {
            _dir: dir,
            platform,
            rules,
            panel,
            controller,
        }
    }
}

/// Category selection by the requester from the panel channel
pub fn select(value: &str) -> ComponentInteraction {
    ComponentInteraction {
        guild_id: GUILD,
        channel_id: PANEL_CHANNEL,
        user: User {
            id: REQUESTER,
            username: "maria".to_string(),
        },
        member_roles: vec![],
        custom_id: CATEGORY_SELECT_ID.to_string(),
        values: vec![value.to_string()],
    }
}

/// Close button pressed by a staff member inside `channel`
pub fn staff_close(channel: ChannelId) -> ComponentInteraction {
    ComponentInteraction {
        guild_id: GUILD,
        channel_id: channel,
        user: User {
            id: STAFF,
            username: "joao".to_string(),
        },
        member_roles: vec![SUPPORT_ROLE],
        custom_id: CLOSE_BUTTON_ID.to_string(),
        values: vec![],
    }
}
