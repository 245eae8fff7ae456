//! Telegram Bot API integration.
//!
//! - [`client`] - HTTP client for the Bot API (long polling + messaging)
//! - [`types`] - Serde types for the subset of the API surface we use
//! - [`error`] - Telegram-specific errors

pub mod client;
pub mod error;
pub mod types;

pub use client::TelegramClient;
pub use error::TelegramError;
