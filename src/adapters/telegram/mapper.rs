//! Map Telegram Bot API types to domain entities and back.
//!
//! Only the fields the bot reads are modelled; serde ignores the rest.

use crate::domain::{InboundMessage, OutboundReply, ReplyKeyboard, Sender};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Clone, Deserialize)]
pub struct TgUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TgMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgMessage {
    pub chat: TgChat,
    #[serde(default)]
    pub from: Option<TgUser>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgChat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
}

/// Map an update to an inbound message.
///
/// * No `message` (edited messages, callbacks, ...) → `None`.
/// * No `from` (anonymous channel posts) → `None`.
/// * No `text` (photo, sticker, ...) → empty text, still handled.
pub fn update_to_domain(update: TgUpdate) -> Option<InboundMessage> {
    let message = update.message?;
    let from = message.from?;
    Some(InboundMessage {
        sender: Sender {
            id: from.id,
            is_bot: from.is_bot,
            first_name: from.first_name,
            last_name: from.last_name,
            username: from.username,
            language_code: from.language_code,
        },
        chat_id: message.chat.id,
        text: message.text.unwrap_or_default(),
    })
}

/// Build the `sendMessage` request body.
pub fn reply_to_payload(reply: &OutboundReply) -> Value {
    let mut payload = json!({
        "chat_id": reply.chat_id,
        "text": reply.text,
    });
    if reply.markdown {
        payload["parse_mode"] = json!("Markdown");
    }
    if reply.disable_link_preview {
        payload["disable_web_page_preview"] = json!(true);
    }
    if let Some(keyboard) = &reply.keyboard {
        payload["reply_markup"] = keyboard_markup(keyboard);
    }
    payload
}

fn keyboard_markup(keyboard: &ReplyKeyboard) -> Value {
    json!({
        "keyboard": keyboard.rows.iter().map(|row| {
            row.iter().map(|label| json!({ "text": label })).collect::<Vec<_>>()
        }).collect::<Vec<_>>(),
        "resize_keyboard": true,
    })
}
