//! Infrastructure adapters. Implement outbound ports.
//!
//! Telegram, upstream HTTP sources, SQLite. Map errors to DomainError.

pub mod http;
pub mod persistence;
pub mod telegram;
