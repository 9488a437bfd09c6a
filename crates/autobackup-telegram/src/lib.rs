pub mod client;
pub mod error;

// Re-exports
pub use client::{BotUser, TelegramClient};
pub use error::{Error, Result};
