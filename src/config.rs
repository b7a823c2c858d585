//! Bot configuration
//!
//! Loaded once at startup from a TOML file, then overridden by environment:
//! - `DISCORD_TOKEN` replaces `token`
//! - `DISCORD_PUBLIC_KEY` replaces `application_public_key`
//! - `PORT` replaces `port`
//!
//! ```toml
//! token = "..."
//! application_public_key = "..."
//! ticket_channel_id = "123"
//! ticket_category_id = "456"
//! support_role_id = "789"
//! ```

use crate::discord::{SignatureVerifier, DEFAULT_API_BASE};
use crate::error::{Result, TicketError};
use crate::rules::DEFAULT_RULES_PATH;
use crate::tickets::TicketSettings;
use crate::types::{ChannelId, RoleId};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_CONFIG_PATH: &str = "ticketdesk.toml";

const ENV_TOKEN: &str = "DISCORD_TOKEN";
const ENV_PUBLIC_KEY: &str = "DISCORD_PUBLIC_KEY";
const ENV_PORT: &str = "PORT";

/// Complete bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bot token
    #[serde(default)]
    pub token: String,

    /// Hex Ed25519 key used to verify interaction requests
    #[serde(default)]
    pub application_public_key: String,

    /// Channel the ticket panel is posted to
    pub ticket_channel_id: ChannelId,

    /// Category new ticket channels are created under
    pub ticket_category_id: ChannelId,

    /// Staff role with access to every ticket
    pub support_role_id: RoleId,

    #[serde(default = "default_rules_path")]
    pub rules_path: PathBuf,

    /// Static assets served by the control API
    #[serde(default = "default_web_dir")]
    pub web_dir: PathBuf,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_rules_path() -> PathBuf {
    PathBuf::from(DEFAULT_RULES_PATH)
}

fn default_web_dir() -> PathBuf {
    PathBuf::from("web")
}

fn default_port() -> u16 {
    5000
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

impl BotConfig {
    /// Load from a TOML file and apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TicketError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            TicketError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config file: {}", e),
            ))
        })?;

        let mut config = Self::from_toml(&content)?;
        config.apply_env()?;
        config.validate()?;

        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Parse without environment overrides or validation
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(token) = non_empty_env(ENV_TOKEN) {
            debug!("Using bot token from {}", ENV_TOKEN);
            self.token = token;
        }
        if let Some(key) = non_empty_env(ENV_PUBLIC_KEY) {
            debug!("Using public key from {}", ENV_PUBLIC_KEY);
            self.application_public_key = key;
        }
        if let Some(port) = non_empty_env(ENV_PORT) {
            self.port = port
                .parse()
                .map_err(|_| TicketError::Config(format!("Invalid {}: {:?}", ENV_PORT, port)))?;
        }
        Ok(())
    }

    /// Reject configurations the bot cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(TicketError::Config(format!(
                "Bot token not set. Set `token` in the config file or the {} environment variable",
                ENV_TOKEN
            )));
        }
        for (name, id) in [
            ("ticket_channel_id", self.ticket_channel_id.0),
            ("ticket_category_id", self.ticket_category_id.0),
            ("support_role_id", self.support_role_id.0),
        ] {
            if id == 0 {
                return Err(TicketError::Config(format!("{} must be set", name)));
            }
        }
        self.signature_verifier()?;
        Ok(())
    }

    pub fn signature_verifier(&self) -> Result<SignatureVerifier> {
        SignatureVerifier::from_hex(&self.application_public_key)
    }

    pub fn ticket_settings(&self) -> TicketSettings {
        TicketSettings {
            parent_category: self.ticket_category_id,
            support_role: self.support_role_id,
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
