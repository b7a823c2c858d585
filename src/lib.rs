//! Ticket Desk - Support Ticket Workflow for Discord
//!
//! A support-ticket bot layered on a group-chat platform:
//! - A panel message lets users pick a support category
//! - A private ticket channel is created per requester and category
//! - Staff close tickets from a button inside the channel
//! - An HTTP control API edits the rules shown on the panel and in tickets
//!
//! # Architecture
//!
//! - **Types**: Categories, rule documents, snowflake ids
//! - **Rules**: JSON-file rule store, re-read on every render
//! - **Panel**: Category-selection message publisher
//! - **Tickets**: Creation/close controller with a per-key creation lock
//! - **Platform**: Chat platform boundary; **Discord** implements it
//! - **API**: Control endpoints and interaction ingress

pub mod api;
pub mod config;
pub mod discord;
pub mod error;
pub mod panel;
pub mod platform;
pub mod rules;
pub mod tickets;
pub mod types;

// Re-export commonly used types
pub use config::BotConfig;
pub use error::{PlatformErrorKind, Result, TicketError};
pub use panel::PanelRenderer;
pub use platform::ChatPlatform;
pub use rules::RuleStore;
pub use tickets::{TicketController, TicketSettings};
pub use types::{Category, RuleDocument, TicketKey};
