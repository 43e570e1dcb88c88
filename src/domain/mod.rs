//! Core domain layer. No external I/O dependencies.
//!
//! Entities, the command table and errors live here. Dependencies flow inward.

pub mod commands;
pub mod entities;
pub mod errors;

pub use commands::{Command, main_keyboard};
pub use entities::{
    Category, InboundMessage, Item, NewsDigest, OutboundReply, RegionDigest, ReplyKeyboard,
    Sender, WeatherForecast, WeatherPoint, Wind,
};
pub use errors::DomainError;
