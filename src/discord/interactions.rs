//! Interaction payloads
//!
//! Decodes the subset of Discord interaction objects the ticket workflow
//! reacts to and encodes [`InteractionResponse`] into callback JSON.

use crate::error::Result;
use crate::platform::{ComponentInteraction, InteractionResponse, User};
use crate::types::{ChannelId, GuildId, RoleId, UserId};
use serde::Deserialize;
use serde_json::{json, Value};

const INTERACTION_PING: u8 = 1;
const INTERACTION_MESSAGE_COMPONENT: u8 = 3;

const RESPONSE_PONG: u8 = 1;
const RESPONSE_CHANNEL_MESSAGE: u8 = 4;
const RESPONSE_DEFERRED_UPDATE: u8 = 6;

const FLAG_EPHEMERAL: u64 = 1 << 6;

/// Decoded inbound interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Ping,
    Component(ComponentInteraction),
    /// Commands, modals, DMs and anything else this bot does not handle
    Unsupported,
}

#[derive(Debug, Deserialize)]
struct RawInteraction {
    #[serde(rename = "type")]
    kind: u8,
    guild_id: Option<GuildId>,
    channel_id: Option<ChannelId>,
    member: Option<RawMember>,
    data: Option<RawComponentData>,
}

#[derive(Debug, Deserialize)]
struct RawMember {
    user: RawUser,
    #[serde(default)]
    roles: Vec<RoleId>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: UserId,
    username: String,
}

#[derive(Debug, Deserialize)]
struct RawComponentData {
    custom_id: Option<String>,
    #[serde(default)]
    values: Vec<String>,
}

/// Decode an interaction request body
pub fn parse_interaction(body: &[u8]) -> Result<Inbound> {
    let raw: RawInteraction = serde_json::from_slice(body)?;

    match raw.kind {
        INTERACTION_PING => Ok(Inbound::Ping),
        INTERACTION_MESSAGE_COMPONENT => {
            let (Some(guild_id), Some(channel_id), Some(member), Some(data)) =
                (raw.guild_id, raw.channel_id, raw.member, raw.data)
            else {
                return Ok(Inbound::Unsupported);
            };
            let Some(custom_id) = data.custom_id else {
                return Ok(Inbound::Unsupported);
            };

            Ok(Inbound::Component(ComponentInteraction {
                guild_id,
                channel_id,
                user: User {
                    id: member.user.id,
                    username: member.user.username,
                },
                member_roles: member.roles,
                custom_id,
                values: data.values,
            }))
        }
        _ => Ok(Inbound::Unsupported),
    }
}

/// Encode an initial response as interaction callback JSON
pub fn response_body(response: &InteractionResponse) -> Value {
    match response {
        InteractionResponse::Pong => json!({ "type": RESPONSE_PONG }),
        InteractionResponse::DeferredUpdate => json!({ "type": RESPONSE_DEFERRED_UPDATE }),
        InteractionResponse::Message(reply) => {
            let mut data = json!({
                "content": reply.content,
                "allowed_mentions": { "parse": [] },
            });
            if reply.ephemeral {
                data["flags"] = json!(FLAG_EPHEMERAL);
            }
            json!({ "type": RESPONSE_CHANNEL_MESSAGE, "data": data })
        }
    }
}
