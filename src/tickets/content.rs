//! Ticket text: channel names, the welcome message, and user-facing replies

use crate::platform::{
    ButtonStyle, ChannelSpec, Component, Embed, OutgoingMessage, PermissionOverwrite,
    Permissions, Principal, User, EMBED_COLOR,
};
use crate::types::{Category, ChannelId, RoleId, RuleDocument};

/// Custom id of the close button inside a ticket
pub const CLOSE_BUTTON_ID: &str = "close_ticket";
pub const CLOSE_BUTTON_LABEL: &str = "Fechar Ticket";

pub const REPLY_IN_PROGRESS: &str = "Você já tem um ticket em criação. Aguarde um momento.";
pub const REPLY_MEMBER_UNAVAILABLE: &str =
    "Não foi possível carregar suas informações. Tente novamente.";
pub const REPLY_ROLE_MISCONFIGURED: &str = "Erro: Cargo de suporte não configurado corretamente. \
Verifique o support_role_id no arquivo de configuração.";
pub const REPLY_NO_PERMISSION: &str = "Não tenho permissão para criar um canal nesta categoria.";
pub const REPLY_PARENT_NOT_FOUND: &str =
    "A categoria especificada não foi encontrada. Verifique o ID da categoria.";
pub const REPLY_GENERIC_FAILURE: &str = "Houve um erro ao criar o ticket, tente novamente.";
pub const REPLY_CLOSE_DENIED: &str = "Você não tem permissão para fechar este ticket.";
pub const REPLY_CLOSING: &str = "Fechando o ticket...";

pub fn reply_created(channel: ChannelId) -> String {
    format!("Ticket criado com sucesso! Veja em <#{}>", channel)
}

/// `ticket-{username}-{category slug}`
pub fn channel_name(username: &str, category: Category) -> String {
    format!("ticket-{}-{}", username, category.slug())
}

/// Private channel: hidden from everyone, open to the requester and staff
pub fn channel_spec(
    requester: &User,
    support_role: RoleId,
    category: Category,
    parent: ChannelId,
) -> ChannelSpec {
    ChannelSpec {
        name: channel_name(&requester.username, category),
        parent,
        overwrites: vec![
            PermissionOverwrite::deny(Principal::Everyone, Permissions::VIEW_CHANNEL),
            PermissionOverwrite::allow(Principal::Member(requester.id), Permissions::participant()),
            PermissionOverwrite::allow(Principal::Role(support_role), Permissions::participant()),
        ],
    }
}

/// First message posted inside a new ticket
pub fn welcome_message(
    requester: &User,
    support_role: RoleId,
    category: Category,
    rules: &RuleDocument,
) -> OutgoingMessage {
    let description = format!(
        "Olá {mention}, bem-vindo ao seu ticket para **{name}**. Por favor, explique sua \
         solicitação. Nossa equipe responderá em breve!\n\n**Regras do Ticket:**\n{rules}",
        mention = requester.mention(),
        name = category.display_name(),
        rules = rules.ticket_text(),
    );

    OutgoingMessage {
        content: Some(format!("{} <@&{}>", requester.mention(), support_role)),
        embeds: vec![Embed {
            title: format!("Ticket - {}", category.display_name()),
            description,
            color: EMBED_COLOR,
            footer: None,
        }],
        components: vec![Component::Button {
            custom_id: CLOSE_BUTTON_ID.to_string(),
            label: CLOSE_BUTTON_LABEL.to_string(),
            style: ButtonStyle::Danger,
        }],
    }
}
