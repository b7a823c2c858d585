//! Ticket lifecycle
//!
//! - [`controller`]: creation and close transitions
//! - [`lock`]: per (requester, category) creation lock
//! - [`content`]: channel naming, welcome message, reply text

pub mod content;
pub mod controller;
pub mod lock;

pub use content::CLOSE_BUTTON_ID;
pub use controller::{
    CloseOutcome, ComponentOutcome, CreationFailure, CreationOutcome, TicketController,
    TicketSettings,
};
pub use lock::{CreationGuard, CreationLocks};
