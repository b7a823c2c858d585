//! Error types for the ticket desk
//!
//! This module provides structured error definitions using thiserror and a
//! classification of chat-platform failures used to pick user-facing replies.

use thiserror::Error;

/// Coarse classification of a chat-platform API failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformErrorKind {
    /// The bot lacks a permission for the attempted operation
    MissingPermissions,
    /// A referenced channel, role, member or user does not exist
    NotFound,
    /// Anything else, including transport failures
    Other,
}

impl PlatformErrorKind {
    /// Classify a platform JSON error code, falling back to the HTTP status
    pub fn classify(code: Option<u64>, status: Option<u16>) -> Self {
        match code {
            Some(50013) => return Self::MissingPermissions,
            Some(10003) | Some(10007) | Some(10011) | Some(10013) => return Self::NotFound,
            _ => {}
        }

        match status {
            Some(403) => Self::MissingPermissions,
            Some(404) => Self::NotFound,
            _ => Self::Other,
        }
    }
}

/// Main error type for ticket desk operations
#[derive(Error, Debug)]
pub enum TicketError {
    /// Chat platform rejected a request
    #[error("Platform error ({kind:?}, code {code:?}, status {status:?}): {message}")]
    Platform {
        kind: PlatformErrorKind,
        code: Option<u64>,
        status: Option<u16>,
        message: String,
    },

    /// An initial reply was already sent for this interaction
    #[error("Interaction already replied to")]
    AlreadyReplied,

    /// The interaction reply could not be delivered
    #[error("Interaction reply could not be delivered")]
    ReplyUndeliverable,

    /// Interaction request signature did not verify
    #[error("Invalid interaction signature: {0}")]
    Signature(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl TicketError {
    /// Build a platform error from its raw parts
    pub fn platform(code: Option<u64>, status: Option<u16>, message: impl Into<String>) -> Self {
        TicketError::Platform {
            kind: PlatformErrorKind::classify(code, status),
            code,
            status,
            message: message.into(),
        }
    }

    /// Platform classification of this error; non-platform errors are `Other`
    pub fn platform_kind(&self) -> PlatformErrorKind {
        match self {
            TicketError::Platform { kind, .. } => *kind,
            _ => PlatformErrorKind::Other,
        }
    }
}

/// Result type alias for ticket desk operations
pub type Result<T> = std::result::Result<T, TicketError>;

/// Convert anyhow::Error to TicketError
impl From<anyhow::Error> for TicketError {
    fn from(err: anyhow::Error) -> Self {
        TicketError::Other(err.to_string())
    }
}
