//! Discord implementation of the chat platform boundary
//!
//! - [`client`]: REST client implementing [`crate::platform::ChatPlatform`]
//! - [`interactions`]: decoding inbound interaction payloads and encoding responses
//! - [`signature`]: Ed25519 verification of interaction requests

pub mod client;
pub mod interactions;
pub mod signature;

pub use client::{DiscordClient, DEFAULT_API_BASE};
pub use interactions::{parse_interaction, Inbound};
pub use signature::SignatureVerifier;
