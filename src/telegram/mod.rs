//! Telegram-facing surface: bot construction, command routing, status
//! messages and attachment uploads.

pub mod bot;
pub mod handlers;
pub mod status;
pub mod upload;

pub use bot::{create_bot, setup_bot_commands, Command};
pub use handlers::{schema, HandlerError};
pub use status::{Stage, StatusMessage};

/// The concrete bot type used throughout.
pub type Bot = teloxide::Bot;
