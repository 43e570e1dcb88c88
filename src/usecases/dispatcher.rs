//! Command dispatcher: classify -> fetch -> decode -> format -> reply.
//!
//! Upstream failures (transport or decode) never reach the user in diagnostic
//! form; they become one fixed apology. The usage counter runs alongside the
//! reply and its failures are only logged.

use crate::domain::{Command, DomainError, InboundMessage, OutboundReply, main_keyboard};
use crate::ports::{ChatPort, MessageHandler, SourcePort, UsageCounterPort};
use crate::usecases::decoder::{decode_news_digest, decode_region_digest, decode_weather_forecast};
use crate::usecases::formatter::{
    clear_sky_icon, format_news_digest, format_region_digest, format_weather_forecast,
};
use std::sync::Arc;
use tracing::{error, info, warn};

pub const GREETING: &str = "Hi, i'm a ukr news bot.";
pub const APOLOGY: &str = "Something going wrong, try to change your question";

/// Upstream URLs, one per fetching command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub news: String,
    pub region: String,
    pub weather: String,
}

pub struct Dispatcher {
    source: Arc<dyn SourcePort>,
    chat: Arc<dyn ChatPort>,
    counter: Arc<dyn UsageCounterPort>,
    endpoints: Endpoints,
}

impl Dispatcher {
    pub fn new(
        source: Arc<dyn SourcePort>,
        chat: Arc<dyn ChatPort>,
        counter: Arc<dyn UsageCounterPort>,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            source,
            chat,
            counter,
            endpoints,
        }
    }

    /// Build the reply for one message. Does not touch the counter or send anything.
    pub async fn reply_for(&self, message: &InboundMessage) -> OutboundReply {
        let chat_id = message.chat_id;
        match Command::classify(&message.text) {
            Some(Command::Start) => OutboundReply::plain(chat_id, GREETING).with_keyboard(main_keyboard()),
            Some(Command::GlobalNews) => {
                self.digest(chat_id, &self.endpoints.news, |bytes| {
                    decode_news_digest(bytes).map(|d| format_news_digest(&d))
                })
                .await
            }
            Some(Command::RegionalNews) => {
                self.digest(chat_id, &self.endpoints.region, |bytes| {
                    decode_region_digest(bytes).map(|d| format_region_digest(&d))
                })
                .await
            }
            Some(Command::Weather) => {
                self.digest(chat_id, &self.endpoints.weather, |bytes| {
                    decode_weather_forecast(bytes).map(|f| format_weather_forecast(&f))
                })
                .await
            }
            None => OutboundReply::plain(chat_id, clear_sky_icon()).with_keyboard(main_keyboard()),
        }
    }

    async fn digest<F>(&self, chat_id: i64, url: &str, render: F) -> OutboundReply
    where
        F: FnOnce(&[u8]) -> Result<String, DomainError>,
    {
        let rendered = match self.source.fetch(url).await {
            Ok(bytes) => render(&bytes),
            Err(e) => Err(e),
        };
        match rendered {
            Ok(text) => OutboundReply::markdown(chat_id, text).with_keyboard(main_keyboard()),
            Err(e) => {
                error!(chat_id, url = %redact_query(url), error = %e, "upstream request failed");
                OutboundReply::plain(chat_id, APOLOGY)
            }
        }
    }

    async fn count_request(&self, message: &InboundMessage) {
        if let Err(e) = self.counter.ensure_user_and_increment(&message.sender).await {
            warn!(user_id = message.sender.id, error = %e, "usage counter update failed");
        }
    }

    async fn reply(&self, message: &InboundMessage) {
        let reply = self.reply_for(message).await;
        match self.chat.send(&reply).await {
            Ok(()) => info!(
                user = %message.sender.log_name(),
                text = %message.text,
                "sent"
            ),
            Err(e) => warn!(chat_id = message.chat_id, error = %e, "reply not delivered"),
        }
    }
}

#[async_trait::async_trait]
impl MessageHandler for Dispatcher {
    async fn handle(&self, message: InboundMessage) {
        tokio::join!(self.count_request(&message), self.reply(&message));
    }
}

/// Drop the query string so API keys do not end up in logs.
fn redact_query(url: &str) -> &str {
    url.split_once('?').map(|(base, _)| base).unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Sender;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const NEWS_URL: &str = "https://news.test/news.json";
    const REGION_URL: &str = "https://news.test/regions.json?snr=18";
    const WEATHER_URL: &str = "https://weather.test/forecast?appid=secret";

    #[derive(Default)]
    struct FakeSource {
        bodies: HashMap<String, Vec<u8>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn with(mut self, url: &str, body: &str) -> Self {
            self.bodies.insert(url.to_string(), body.as_bytes().to_vec());
            self
        }
    }

    #[async_trait::async_trait]
    impl SourcePort for FakeSource {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, DomainError> {
            self.calls.lock().unwrap().push(url.to_string());
            self.bodies
                .get(url)
                .cloned()
                .ok_or_else(|| DomainError::Transport("connection refused".into()))
        }
    }

    #[derive(Default)]
    struct RecordingChat {
        sent: Mutex<Vec<OutboundReply>>,
    }

    #[async_trait::async_trait]
    impl ChatPort for RecordingChat {
        async fn send(&self, reply: &OutboundReply) -> Result<(), DomainError> {
            self.sent.lock().unwrap().push(reply.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingStore {
        counts: Mutex<HashMap<i64, u32>>,
        broken: bool,
    }

    #[async_trait::async_trait]
    impl UsageCounterPort for CountingStore {
        async fn ensure_user_and_increment(&self, sender: &Sender) -> Result<(), DomainError> {
            if self.broken {
                return Err(DomainError::CounterStore("database is locked".into()));
            }
            *self.counts.lock().unwrap().entry(sender.id).or_insert(0) += 1;
            Ok(())
        }
    }

    struct Harness {
        source: Arc<FakeSource>,
        chat: Arc<RecordingChat>,
        store: Arc<CountingStore>,
        dispatcher: Dispatcher,
    }

    fn harness(source: FakeSource, store: CountingStore) -> Harness {
        let source = Arc::new(source);
        let chat = Arc::new(RecordingChat::default());
        let store = Arc::new(store);
        let dispatcher = Dispatcher::new(
            source.clone(),
            chat.clone(),
            store.clone(),
            Endpoints {
                news: NEWS_URL.into(),
                region: REGION_URL.into(),
                weather: WEATHER_URL.into(),
            },
        );
        Harness {
            source,
            chat,
            store,
            dispatcher,
        }
    }

    fn message(text: &str) -> InboundMessage {
        InboundMessage {
            sender: Sender {
                id: 42,
                is_bot: false,
                first_name: "Olena".into(),
                last_name: None,
                username: Some("olena".into()),
                language_code: Some("uk".into()),
            },
            chat_id: 4242,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_news_command_sends_markdown_digest() {
        let news = r#"{"news":[{"id":13,"title":"Top","items":[{"title":"A","url":"u1"}]},{"id":99,"title":"Skip","items":[]}]}"#;
        let h = harness(FakeSource::default().with(NEWS_URL, news), CountingStore::default());

        h.dispatcher.handle(message("Головні новини")).await;

        let sent = h.chat.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, 4242);
        assert_eq!(sent[0].text, "*Top*\n- A. [More](u1).");
        assert!(sent[0].markdown);
        assert!(sent[0].disable_link_preview);
        assert_eq!(sent[0].keyboard, Some(main_keyboard()));
        assert_eq!(h.store.counts.lock().unwrap().get(&42), Some(&1));
    }

    #[tokio::test]
    async fn test_region_and_weather_use_their_endpoints() {
        let region = r#"{"region":[{"title":"R","url":"r1"}]}"#;
        let weather = r#"{"city":{"timezone":7200},"list":[
            {"dt":1704067200,"main":{"temp":5.9},"weather":[{"icon":"10d","description":"дощ"}],"wind":{"speed":3.0,"deg":90}}
        ]}"#;
        let h = harness(
            FakeSource::default()
                .with(REGION_URL, region)
                .with(WEATHER_URL, weather),
            CountingStore::default(),
        );

        let reply = h.dispatcher.reply_for(&message("Новини Сумщини")).await;
        assert_eq!(reply.text, "*Новини Сумщини*\n- R. [More](r1).");

        let reply = h.dispatcher.reply_for(&message("Погода")).await;
        assert_eq!(
            reply.text,
            "*Погода в Сумах*\n*01 January 2024*\n02:00 *+5*℃ 🌦  дощ ⬅️ 3м/с"
        );
        assert!(reply.markdown);

        assert_eq!(
            *h.source.calls.lock().unwrap(),
            vec![REGION_URL.to_string(), WEATHER_URL.to_string()]
        );
    }

    #[tokio::test]
    async fn test_transport_error_yields_apology() {
        let h = harness(FakeSource::default(), CountingStore::default());

        h.dispatcher.handle(message("Головні новини")).await;

        let sent = h.chat.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], OutboundReply::plain(4242, APOLOGY));
        assert_eq!(h.store.counts.lock().unwrap().get(&42), Some(&1));
    }

    #[tokio::test]
    async fn test_decode_error_yields_apology() {
        let h = harness(
            FakeSource::default().with(WEATHER_URL, r#"{"city":{"timezone":0},"list":[{"dt":1}]}"#),
            CountingStore::default(),
        );
        let reply = h.dispatcher.reply_for(&message("Погода")).await;
        assert_eq!(reply.text, APOLOGY);
        assert!(!reply.markdown);
    }

    #[tokio::test]
    async fn test_unrecognized_text_gets_fallback_and_is_counted_once() {
        let h = harness(FakeSource::default(), CountingStore::default());

        h.dispatcher.handle(message("Налаштування")).await;

        let sent = h.chat.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, "☀️");
        assert!(!sent[0].markdown);
        assert_eq!(sent[0].keyboard, Some(main_keyboard()));
        assert!(h.source.calls.lock().unwrap().is_empty());
        assert_eq!(h.store.counts.lock().unwrap().get(&42), Some(&1));
    }

    #[tokio::test]
    async fn test_start_greets_without_fetching() {
        let h = harness(FakeSource::default(), CountingStore::default());
        let reply = h.dispatcher.reply_for(&message("/start")).await;
        assert_eq!(reply.text, GREETING);
        assert!(h.source.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_counter_failure_does_not_block_reply() {
        let store = CountingStore {
            broken: true,
            ..Default::default()
        };
        let h = harness(FakeSource::default(), store);

        h.dispatcher.handle(message("/start")).await;

        assert_eq!(h.chat.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_counter_accumulates_per_sender() {
        let h = harness(FakeSource::default(), CountingStore::default());
        for _ in 0..3 {
            h.dispatcher.handle(message("hello")).await;
        }
        assert_eq!(h.store.counts.lock().unwrap().get(&42), Some(&3));
    }

    #[test]
    fn test_redact_query() {
        assert_eq!(redact_query(WEATHER_URL), "https://weather.test/forecast");
        assert_eq!(redact_query(NEWS_URL), NEWS_URL);
    }
}
