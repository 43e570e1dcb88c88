//! Telegram Bot API adapter.

pub mod bot_api;
pub mod mapper;

pub use bot_api::BotApiClient;
