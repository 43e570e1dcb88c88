//! Domain entities. Pure data structures for the core business.
//!
//! No Telegram/IO types here; adapters map into these.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A single headline with its link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub title: String,
    pub url: String,
}

impl Item {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// A whitelisted news category and its items, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub title: String,
    pub items: Vec<Item>,
}

/// Global news, filtered down to the whitelisted categories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsDigest {
    pub categories: Vec<Category>,
}

/// Regional news. Every item from the source, unfiltered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionDigest {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    /// Meters per second.
    pub speed: f64,
    /// Meteorological degrees, [0, 360).
    pub deg: f64,
}

/// One forecast slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherPoint {
    /// Unix seconds, UTC.
    pub timestamp: i64,
    /// Degrees Celsius, truncated toward zero.
    pub temperature: i64,
    /// Provider condition code, e.g. `01d`.
    pub icon: String,
    pub description: String,
    pub wind: Wind,
}

/// Forecast for a single city. Points keep source (chronological) order.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherForecast {
    pub offset: FixedOffset,
    pub points: Vec<WeatherPoint>,
}

impl WeatherForecast {
    /// Wall-clock time of `point` in the forecast city.
    pub fn local_time(&self, point: &WeatherPoint) -> Option<DateTime<FixedOffset>> {
        DateTime::from_timestamp(point.timestamp, 0).map(|utc| utc.with_timezone(&self.offset))
    }
}

/// The author of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
}

impl Sender {
    /// Name used in log lines: username when present, else the numeric id.
    pub fn log_name(&self) -> String {
        self.username
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// A text message received from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub sender: Sender,
    pub chat_id: i64,
    /// Empty when the message carried no text (photo, sticker, ...).
    pub text: String,
}

/// Persistent reply keyboard with command shortcuts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyKeyboard {
    pub rows: Vec<Vec<String>>,
}

/// A reply ready to be sent to the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundReply {
    pub chat_id: i64,
    pub text: String,
    pub markdown: bool,
    pub disable_link_preview: bool,
    pub keyboard: Option<ReplyKeyboard>,
}

impl OutboundReply {
    /// Plain text reply: no markdown, previews left on, no keyboard.
    pub fn plain(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            markdown: false,
            disable_link_preview: false,
            keyboard: None,
        }
    }

    /// Formatted digest: markdown on, link previews off.
    pub fn markdown(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            markdown: true,
            disable_link_preview: true,
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: ReplyKeyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}
