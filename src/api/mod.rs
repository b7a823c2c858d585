//! HTTP API
//!
//! Provides:
//! - Rules update endpoint (persists, then republishes the panel)
//! - Bot connection status probe
//! - Signed interaction ingress for panel and ticket controls
//! - Static web assets

pub mod server;

pub use server::{ApiServer, ApiServerConfig, AppState};
