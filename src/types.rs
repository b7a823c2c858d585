//! Core data types for the ticket desk
//!
//! Snowflake identifiers, the closed set of support categories, the rules
//! document shown on the panel and inside tickets, and the key that scopes a
//! ticket creation attempt.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl $name {
            /// Parse an identifier from its decimal string form
            pub fn parse(s: &str) -> Option<Self> {
                s.trim().parse().ok().map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserializer.deserialize_any(SnowflakeVisitor).map(Self)
            }
        }
    };
}

/// Accepts snowflakes encoded either as decimal strings or as integers
struct SnowflakeVisitor;

impl<'de> serde::de::Visitor<'de> for SnowflakeVisitor {
    type Value = u64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a snowflake id as a string or integer")
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<u64, E> {
        Ok(v)
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<u64, E> {
        u64::try_from(v).map_err(|_| E::custom("negative snowflake"))
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<u64, E> {
        v.trim()
            .parse()
            .map_err(|_| E::custom(format!("invalid snowflake: {:?}", v)))
    }
}

snowflake_id!(
    /// Chat-platform user identifier
    UserId
);
snowflake_id!(
    /// Chat-platform channel (or channel category) identifier
    ChannelId
);
snowflake_id!(
    /// Chat-platform role identifier
    RoleId
);
snowflake_id!(
    /// Chat-platform guild (server) identifier
    GuildId
);

impl GuildId {
    /// The implicit "@everyone" role shares the guild's identifier
    pub fn everyone_role(&self) -> RoleId {
        RoleId(self.0)
    }
}

/// Support topic a ticket is opened for
///
/// The menu value, the display name, and the menu label are all derived from
/// this one enum so the panel, the channel name, and the controller agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Duvidas,
    Denuncias,
    Reembolso,
    Parceria,
}

impl Category {
    /// All categories in panel order
    pub const ALL: [Category; 4] = [
        Category::Duvidas,
        Category::Denuncias,
        Category::Reembolso,
        Category::Parceria,
    ];

    /// Internal value carried by the select menu option
    pub fn value(&self) -> &'static str {
        match self {
            Category::Duvidas => "duvidas",
            Category::Denuncias => "denuncias",
            Category::Reembolso => "reembolso",
            Category::Parceria => "parceria",
        }
    }

    /// Human-readable name used in ticket text and channel names
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Duvidas => "Dúvidas",
            Category::Denuncias => "Denúncias",
            Category::Reembolso => "Reembolso",
            Category::Parceria => "Parceria",
        }
    }

    /// Menu label, display name prefixed with the category emoji
    pub fn label(&self) -> &'static str {
        match self {
            Category::Duvidas => "🤔 Dúvidas",
            Category::Denuncias => "⚠️ Denúncias",
            Category::Reembolso => "💱 Reembolso",
            Category::Parceria => "🤝 Parceria",
        }
    }

    /// Resolve a select menu value back to its category
    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.value() == value)
    }

    /// Channel-name fragment: lower-cased display name, spaces replaced
    pub fn slug(&self) -> String {
        self.display_name().to_lowercase().replace(' ', "-")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Ordered rule text shown on the panel and inside new tickets
///
/// Always replaced wholesale; there are no partial updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDocument {
    pub panel_rules: Vec<String>,
    pub ticket_rules: Vec<String>,
}

impl RuleDocument {
    pub fn new(panel_rules: Vec<String>, ticket_rules: Vec<String>) -> Self {
        Self {
            panel_rules,
            ticket_rules,
        }
    }

    /// Panel rules joined one per line, in order
    pub fn panel_text(&self) -> String {
        self.panel_rules.join("\n")
    }

    /// Ticket rules joined one per line, in order
    pub fn ticket_text(&self) -> String {
        self.ticket_rules.join("\n")
    }
}

/// Scope of a single ticket creation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TicketKey {
    pub requester: UserId,
    pub category: Category,
}

impl TicketKey {
    pub fn new(requester: UserId, category: Category) -> Self {
        Self {
            requester,
            category,
        }
    }
}

impl fmt::Display for TicketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.requester, self.category)
    }
}
