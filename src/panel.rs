//! Ticket panel
//!
//! Builds the category-selection message from the current panel rules and
//! posts it to the configured panel channel. Every publish sends a fresh
//! message; earlier panels are left untouched.

use crate::platform::{
    ChatPlatform, Component, Embed, OutgoingMessage, SelectOption, EMBED_COLOR,
};
use crate::rules::RuleStore;
use crate::types::{Category, ChannelId, RuleDocument};
use std::sync::Arc;
use tracing::{error, info};

/// Custom id of the category select menu
pub const CATEGORY_SELECT_ID: &str = "ticket_category";

pub const PANEL_TITLE: &str = "Sorimes Community - Sistema de Tickets";
pub const PANEL_FOOTER: &str = "Sorimes Community - Suporte e Parcerias";
pub const PANEL_PLACEHOLDER: &str = "Selecione uma categoria";

const PANEL_INTRO: &str = "Bem-vindo(a) à categoria de suporte da Sorimes Community! \
Este canal é destinado a suportes gerais, parcerias, entre outros.\n\
**O mal uso da ferramenta de suporte terá punição a critério da equipe de moderação.**\n\n\
**Regras:**\n";
const PANEL_OUTRO: &str = "\n\nEscolha uma categoria para abrir um ticket:";

/// Render the panel message for a rules document
pub fn build_panel(rules: &RuleDocument) -> OutgoingMessage {
    let description = format!("{}{}{}", PANEL_INTRO, rules.panel_text(), PANEL_OUTRO);

    let options = Category::ALL
        .iter()
        .map(|c| SelectOption {
            label: c.label().to_string(),
            value: c.value().to_string(),
        })
        .collect();

    OutgoingMessage {
        content: None,
        embeds: vec![Embed {
            title: PANEL_TITLE.to_string(),
            description,
            color: EMBED_COLOR,
            footer: Some(PANEL_FOOTER.to_string()),
        }],
        components: vec![Component::SelectMenu {
            custom_id: CATEGORY_SELECT_ID.to_string(),
            placeholder: PANEL_PLACEHOLDER.to_string(),
            options,
        }],
    }
}

/// Publishes the ticket panel to a fixed channel
pub struct PanelRenderer {
    platform: Arc<dyn ChatPlatform>,
    rules: Arc<RuleStore>,
    channel_id: ChannelId,
}

impl PanelRenderer {
    pub fn new(platform: Arc<dyn ChatPlatform>, rules: Arc<RuleStore>, channel_id: ChannelId) -> Self {
        Self {
            platform,
            rules,
            channel_id,
        }
    }

    /// Post a fresh panel; failures are logged, never raised
    pub async fn publish(&self) {
        let channel = match self.platform.fetch_channel(self.channel_id).await {
            Ok(channel) => channel,
            Err(e) => {
                error!(
                    "Ticket panel channel {} could not be resolved: {}",
                    self.channel_id, e
                );
                return;
            }
        };

        let rules = self.rules.load().await;
        let panel = build_panel(&rules);

        match self.platform.send_message(channel.id, &panel).await {
            Ok(()) => info!("Published ticket panel to #{} ({})", channel.name, channel.id),
            Err(e) => error!("Failed to publish ticket panel to {}: {}", channel.id, e),
        }
    }
}
