//! Telegram Bot API client over reqwest. Implements `UpdatesPort` (long-polling
//! `getUpdates`) and `ChatPort` (`sendMessage`).

use crate::adapters::telegram::mapper::{TgUpdate, reply_to_payload, update_to_domain};
use crate::domain::{DomainError, InboundMessage, OutboundReply};
use crate::ports::{ChatPort, UpdatesPort};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Extra slack on top of the long-poll timeout before the HTTP client gives up.
const REQUEST_TIMEOUT_SLACK_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

pub struct BotApiClient {
    client: Client,
    /// `<base>/bot<token>`; never logged.
    api_url: String,
    poll_timeout_secs: u64,
    /// Next `update_id` to request. `None` until the first batch arrives.
    offset: Mutex<Option<i64>>,
}

impl BotApiClient {
    pub fn new(base_url: &str, token: &str, poll_timeout_secs: u64) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(
                poll_timeout_secs + REQUEST_TIMEOUT_SLACK_SECS,
            ))
            .build()
            .map_err(|e| DomainError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_url: format!("{}/bot{}", base_url.trim_end_matches('/'), token),
            poll_timeout_secs,
            offset: Mutex::new(None),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &serde_json::Value,
    ) -> Result<T, DomainError> {
        let url = format!("{}/{}", self.api_url, method);
        // `without_url` keeps the bot token out of error messages.
        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                DomainError::Channel(format!("{} request failed: {}", method, e.without_url()))
            })?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| DomainError::Channel(format!("{} body: {}", method, e.without_url())))?;
        parse_response(method, status.as_u16(), &body)
    }
}

/// Unwrap the `{ok, result, description}` envelope. Telegram reports API
/// errors (bad markdown, blocked bot, ...) with `ok: false` and a description.
fn parse_response<T: DeserializeOwned>(
    method: &str,
    status: u16,
    body: &[u8],
) -> Result<T, DomainError> {
    let parsed: ApiResponse<T> = serde_json::from_slice(body).map_err(|e| {
        DomainError::Channel(format!(
            "{} returned HTTP {} with unreadable body: {}",
            method, status, e
        ))
    })?;
    if !parsed.ok {
        return Err(DomainError::Channel(format!(
            "{} failed: {}",
            method,
            parsed.description.unwrap_or_else(|| format!("HTTP {}", status))
        )));
    }
    parsed
        .result
        .ok_or_else(|| DomainError::Channel(format!("{} returned no result", method)))
}

/// Offset for the next poll: one past the highest id seen.
fn next_offset(current: Option<i64>, updates: &[TgUpdate]) -> Option<i64> {
    updates
        .iter()
        .map(|u| u.update_id + 1)
        .max()
        .map(|next| current.map_or(next, |c| c.max(next)))
        .or(current)
}

#[async_trait::async_trait]
impl UpdatesPort for BotApiClient {
    async fn poll(&self) -> Result<Vec<InboundMessage>, DomainError> {
        let mut offset = self.offset.lock().await;
        let mut payload = json!({
            "timeout": self.poll_timeout_secs,
            "allowed_updates": ["message"],
        });
        if let Some(o) = *offset {
            payload["offset"] = json!(o);
        }

        let updates: Vec<TgUpdate> = self.call("getUpdates", &payload).await?;
        let next = next_offset(*offset, &updates);
        *offset = next;
        debug!(count = updates.len(), offset = ?next, "received updates");

        Ok(updates.into_iter().filter_map(update_to_domain).collect())
    }
}

#[async_trait::async_trait]
impl ChatPort for BotApiClient {
    async fn send(&self, reply: &OutboundReply) -> Result<(), DomainError> {
        let payload = reply_to_payload(reply);
        let _sent: serde_json::Value = self.call("sendMessage", &payload).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(id: i64) -> TgUpdate {
        TgUpdate {
            update_id: id,
            message: None,
        }
    }

    #[test]
    fn test_next_offset() {
        assert_eq!(next_offset(None, &[]), None);
        assert_eq!(next_offset(Some(5), &[]), Some(5));
        assert_eq!(next_offset(None, &[update(3), update(9), update(4)]), Some(10));
        assert_eq!(next_offset(Some(20), &[update(9)]), Some(20));
    }

    #[test]
    fn test_parse_response_ok() {
        let body = br#"{"ok":true,"result":[{"update_id":1}]}"#;
        let updates: Vec<TgUpdate> = parse_response("getUpdates", 200, body).unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].update_id, 1);
    }

    #[test]
    fn test_parse_response_api_error() {
        let body = br#"{"ok":false,"error_code":400,"description":"Bad Request: can't parse entities"}"#;
        let err = parse_response::<serde_json::Value>("sendMessage", 400, body).unwrap_err();
        match err {
            DomainError::Channel(msg) => assert!(msg.contains("can't parse entities")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_response_garbage() {
        let err = parse_response::<serde_json::Value>("getUpdates", 502, b"<html>").unwrap_err();
        assert!(matches!(err, DomainError::Channel(_)));
    }

    #[test]
    fn test_new_strips_trailing_slash() {
        let client = BotApiClient::new("https://api.telegram.org/", "123:abc", 60).unwrap();
        assert_eq!(client.api_url, "https://api.telegram.org/bot123:abc");
    }
}
