//! Discord REST client
//!
//! Implements [`ChatPlatform`] over the Discord HTTP API with a bot token.
//! The online flag tracks the health of the REST session: it is raised by a
//! successful identity check or request, and dropped on an authentication
//! failure or a transport error.

use crate::error::{Result, TicketError};
use crate::platform::{
    ButtonStyle, Channel, ChannelSpec, ChatPlatform, Component, Member, OutgoingMessage,
    Principal, Role, User,
};
use crate::types::{ChannelId, GuildId, RoleId, UserId};
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

const CHANNEL_TYPE_GUILD_TEXT: u8 = 0;
const OVERWRITE_ROLE: u8 = 0;
const OVERWRITE_MEMBER: u8 = 1;
const COMPONENT_ACTION_ROW: u8 = 1;
const COMPONENT_BUTTON: u8 = 2;
const COMPONENT_STRING_SELECT: u8 = 3;

#[derive(Debug, Deserialize)]
struct ApiError {
    code: Option<u64>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiChannel {
    id: ChannelId,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiRole {
    id: RoleId,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    id: UserId,
    username: String,
}

#[derive(Debug, Deserialize)]
struct ApiMember {
    user: ApiUser,
    #[serde(default)]
    roles: Vec<RoleId>,
}

impl From<ApiChannel> for Channel {
    fn from(c: ApiChannel) -> Self {
        Channel {
            id: c.id,
            name: c.name.unwrap_or_default(),
        }
    }
}

/// Discord REST client authenticated as a bot
pub struct DiscordClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
    online: AtomicBool,
}

impl DiscordClient {
    pub fn new(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
            online: AtomicBool::new(false),
        }
    }

    /// Authenticate by resolving the bot's own user
    pub async fn connect(&self) -> Result<User> {
        let me: ApiUser = self.request(Method::GET, "/users/@me", None).await?;
        info!("Bot connected as {} ({})", me.username, me.id);
        Ok(User {
            id: me.id,
            username: me.username,
        })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T> {
        let response = self.execute(method, path, body).await?;
        response.json().await.map_err(|e| {
            TicketError::platform(None, None, format!("Failed to parse response: {}", e))
        })
    }

    async fn request_empty(&self, method: Method, path: &str, body: Option<Value>) -> Result<()> {
        self.execute(method, path, body).await.map(|_| ())
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<reqwest::Response> {
        debug!("Discord API {} {}", method, path);

        let mut builder = self
            .http
            .request(method, format!("{}{}", self.api_base, path))
            .header("Authorization", format!("Bot {}", self.token))
            .header(
                "User-Agent",
                concat!("DiscordBot (ticketdesk, ", env!("CARGO_PKG_VERSION"), ")"),
            );
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                self.mark_offline("transport error");
                return Err(TicketError::Http(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            self.online.store(true, Ordering::SeqCst);
            return Ok(response);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.mark_offline("authentication rejected");
        }

        let text = response.text().await.unwrap_or_default();
        let parsed: Option<ApiError> = serde_json::from_str(&text).ok();
        let (code, message) = match parsed {
            Some(err) => (err.code, err.message.unwrap_or_else(|| text.clone())),
            None => (None, text),
        };
        Err(TicketError::platform(code, Some(status.as_u16()), message))
    }

    fn mark_offline(&self, reason: &str) {
        if self.online.swap(false, Ordering::SeqCst) {
            warn!("Discord session marked offline: {}", reason);
        }
    }
}

fn principal_entry(guild: GuildId, principal: Principal) -> (String, u8) {
    match principal {
        Principal::Everyone => (guild.everyone_role().to_string(), OVERWRITE_ROLE),
        Principal::Role(role) => (role.to_string(), OVERWRITE_ROLE),
        Principal::Member(user) => (user.to_string(), OVERWRITE_MEMBER),
    }
}

/// JSON body for channel creation
pub(crate) fn channel_payload(guild: GuildId, spec: &ChannelSpec) -> Value {
    let overwrites: Vec<Value> = spec
        .overwrites
        .iter()
        .map(|o| {
            let (id, kind) = principal_entry(guild, o.principal);
            json!({
                "id": id,
                "type": kind,
                "allow": o.allow.bits().to_string(),
                "deny": o.deny.bits().to_string(),
            })
        })
        .collect();

    json!({
        "name": spec.name,
        "type": CHANNEL_TYPE_GUILD_TEXT,
        "parent_id": spec.parent.to_string(),
        "permission_overwrites": overwrites,
    })
}

fn button_style(style: ButtonStyle) -> u8 {
    match style {
        ButtonStyle::Primary => 1,
        ButtonStyle::Secondary => 2,
        ButtonStyle::Success => 3,
        ButtonStyle::Danger => 4,
    }
}

fn component_payload(component: &Component) -> Value {
    match component {
        Component::SelectMenu {
            custom_id,
            placeholder,
            options,
        } => json!({
            "type": COMPONENT_STRING_SELECT,
            "custom_id": custom_id,
            "placeholder": placeholder,
            "options": options
                .iter()
                .map(|o| json!({ "label": o.label, "value": o.value }))
                .collect::<Vec<_>>(),
        }),
        Component::Button {
            custom_id,
            label,
            style,
        } => json!({
            "type": COMPONENT_BUTTON,
            "style": button_style(*style),
            "label": label,
            "custom_id": custom_id,
        }),
    }
}

/// JSON body for a channel message; each component gets its own action row
pub(crate) fn message_payload(message: &OutgoingMessage) -> Value {
    let embeds: Vec<Value> = message
        .embeds
        .iter()
        .map(|e| {
            let mut embed = json!({
                "title": e.title,
                "description": e.description,
                "color": e.color,
            });
            if let Some(footer) = &e.footer {
                embed["footer"] = json!({ "text": footer });
            }
            embed
        })
        .collect();

    let rows: Vec<Value> = message
        .components
        .iter()
        .map(|c| json!({ "type": COMPONENT_ACTION_ROW, "components": [component_payload(c)] }))
        .collect();

    let mut payload = json!({ "embeds": embeds, "components": rows });
    if let Some(content) = &message.content {
        payload["content"] = json!(content);
    }
    payload
}

#[async_trait]
impl ChatPlatform for DiscordClient {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    async fn fetch_channel(&self, channel: ChannelId) -> Result<Channel> {
        let raw: ApiChannel = self
            .request(Method::GET, &format!("/channels/{}", channel), None)
            .await?;
        Ok(raw.into())
    }

    async fn fetch_member(&self, guild: GuildId, user: UserId) -> Result<Member> {
        let raw: ApiMember = self
            .request(
                Method::GET,
                &format!("/guilds/{}/members/{}", guild, user),
                None,
            )
            .await?;
        Ok(Member {
            user: User {
                id: raw.user.id,
                username: raw.user.username,
            },
            roles: raw.roles,
        })
    }

    async fn fetch_role(&self, guild: GuildId, role: RoleId) -> Result<Role> {
        let roles: Vec<ApiRole> = self
            .request(Method::GET, &format!("/guilds/{}/roles", guild), None)
            .await?;
        roles
            .into_iter()
            .find(|r| r.id == role)
            .map(|r| Role {
                id: r.id,
                name: r.name,
            })
            .ok_or_else(|| TicketError::platform(Some(10011), Some(404), "Unknown Role"))
    }

    async fn create_channel(&self, guild: GuildId, spec: &ChannelSpec) -> Result<Channel> {
        let raw: ApiChannel = self
            .request(
                Method::POST,
                &format!("/guilds/{}/channels", guild),
                Some(channel_payload(guild, spec)),
            )
            .await?;
        Ok(raw.into())
    }

    async fn send_message(&self, channel: ChannelId, message: &OutgoingMessage) -> Result<()> {
        self.request_empty(
            Method::POST,
            &format!("/channels/{}/messages", channel),
            Some(message_payload(message)),
        )
        .await
    }

    async fn set_topic(&self, channel: ChannelId, topic: &str) -> Result<()> {
        self.request_empty(
            Method::PATCH,
            &format!("/channels/{}", channel),
            Some(json!({ "topic": topic })),
        )
        .await
    }

    async fn delete_channel(&self, channel: ChannelId) -> Result<()> {
        self.request_empty(Method::DELETE, &format!("/channels/{}", channel), None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlatformErrorKind;
    use crate::platform::{Embed, PermissionOverwrite, Permissions, SelectOption};

    #[test]
    fn test_channel_payload_maps_principals() {
        let spec = ChannelSpec {
            name: "ticket-maria-parceria".to_string(),
            parent: ChannelId(55),
            overwrites: vec![
                PermissionOverwrite::deny(Principal::Everyone, Permissions::VIEW_CHANNEL),
                PermissionOverwrite::allow(Principal::Member(UserId(7)), Permissions::participant()),
                PermissionOverwrite::allow(Principal::Role(RoleId(9)), Permissions::participant()),
            ],
        };

        let payload = channel_payload(GuildId(1), &spec);
        assert_eq!(payload["type"], 0);
        assert_eq!(payload["parent_id"], "55");

        let overwrites = payload["permission_overwrites"].as_array().unwrap();
        assert_eq!(overwrites.len(), 3);
        assert_eq!(overwrites[0], json!({"id": "1", "type": 0, "allow": "0", "deny": "1024"}));
        assert_eq!(overwrites[1]["id"], "7");
        assert_eq!(overwrites[1]["type"], 1);
        assert_eq!(overwrites[1]["allow"], "68608");
        assert_eq!(overwrites[2]["id"], "9");
        assert_eq!(overwrites[2]["type"], 0);
    }

    #[test]
    fn test_message_payload_wraps_components_in_rows() {
        let message = OutgoingMessage {
            content: Some("<@7>".to_string()),
            embeds: vec![Embed {
                title: "T".to_string(),
                description: "D".to_string(),
                color: 0x5865F2,
                footer: Some("F".to_string()),
            }],
            components: vec![
                Component::SelectMenu {
                    custom_id: "menu".to_string(),
                    placeholder: "pick".to_string(),
                    options: vec![SelectOption {
                        label: "L".to_string(),
                        value: "v".to_string(),
                    }],
                },
                Component::Button {
                    custom_id: "btn".to_string(),
                    label: "Close".to_string(),
                    style: ButtonStyle::Danger,
                },
            ],
        };

        let payload = message_payload(&message);
        assert_eq!(payload["content"], "<@7>");
        assert_eq!(payload["embeds"][0]["color"], 0x5865F2);
        assert_eq!(payload["embeds"][0]["footer"]["text"], "F");
        assert_eq!(payload["components"][0]["type"], 1);
        assert_eq!(payload["components"][0]["components"][0]["type"], 3);
        assert_eq!(
            payload["components"][0]["components"][0]["options"][0]["value"],
            "v"
        );
        assert_eq!(payload["components"][1]["components"][0]["style"], 4);
    }

    #[test]
    fn test_message_payload_omits_missing_content() {
        let payload = message_payload(&OutgoingMessage::default());
        assert!(payload.get("content").is_none());
    }

    /// Local stand-in for the Discord API: `/users/@me` succeeds, channel 1
    /// answers 403, channel 2 answers 401, channel 3 succeeds.
    async fn stub_api() -> String {
        use axum::{http::StatusCode, routing::get, Json, Router};

        async fn channel(
            axum::extract::Path(id): axum::extract::Path<u64>,
        ) -> (StatusCode, Json<Value>) {
            match id {
                1 => (
                    StatusCode::FORBIDDEN,
                    Json(json!({"code": 50013, "message": "Missing Permissions"})),
                ),
                2 => (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"code": 0, "message": "401: Unauthorized"})),
                ),
                _ => (StatusCode::OK, Json(json!({"id": id.to_string(), "name": "geral"}))),
            }
        }

        let app = Router::new()
            .route(
                "/users/@me",
                get(|| async { Json(json!({"id": "42", "username": "ticketdesk"})) }),
            )
            .route("/channels/:id", get(channel));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_online_flag_follows_session_health() {
        let client = DiscordClient::new("token", stub_api().await);
        assert!(!client.is_online());

        let me = client.connect().await.unwrap();
        assert_eq!(me.id, UserId(42));
        assert!(client.is_online());

        let err = client.fetch_channel(ChannelId(1)).await.unwrap_err();
        assert_eq!(err.platform_kind(), PlatformErrorKind::MissingPermissions);
        assert!(client.is_online());

        assert!(client.fetch_channel(ChannelId(2)).await.is_err());
        assert!(!client.is_online());

        let channel = client.fetch_channel(ChannelId(3)).await.unwrap();
        assert_eq!(channel.id, ChannelId(3));
        assert!(client.is_online());
    }

    #[tokio::test]
    async fn test_transport_error_marks_offline() {
        // Nothing listens on the discard port
        let unreachable = DiscordClient {
            online: AtomicBool::new(true),
            ..DiscordClient::new("token", "http://127.0.0.1:9")
        };
        assert!(matches!(
            unreachable.fetch_channel(ChannelId(3)).await,
            Err(TicketError::Http(_))
        ));
        assert!(!unreachable.is_online());
    }

    #[test]
    fn test_client_starts_offline() {
        let client = DiscordClient::new("token", "https://example.invalid/api/");
        assert!(!client.is_online());
        assert_eq!(client.api_base, "https://example.invalid/api");
    }
}
