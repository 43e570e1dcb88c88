//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run intake.
//! No business logic here; routing and formatting live in the Dispatcher.

use dotenv::dotenv;
use news_bot::adapters::http::HttpSourceClient;
use news_bot::adapters::persistence::SqliteUsageStore;
use news_bot::adapters::telegram::BotApiClient;
use news_bot::ports::{ChatPort, MessageHandler, SourcePort, UpdatesPort, UsageCounterPort};
use news_bot::shared::config::AppConfig;
use news_bot::usecases::{Dispatcher, IntakeService};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let cfg = AppConfig::load().map_err(|e| anyhow::anyhow!("config: {}", e))?;
    let token = cfg.bot_token().map_err(|e| anyhow::anyhow!("{}", e))?;
    if !cfg.is_weather_configured() {
        warn!("WEATHER_TOKEN is not set; weather requests will get the apology reply");
    }

    // --- Usage counter (SQLite) ---
    let data_dir = PathBuf::from(cfg.data_dir_or_default());
    let store = SqliteUsageStore::connect(&data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?;
    let counter: Arc<dyn UsageCounterPort> = Arc::new(store);

    // --- Telegram (same client polls updates and sends replies) ---
    let bot = Arc::new(
        BotApiClient::new(
            &cfg.telegram_api_url_or_default(),
            &token,
            cfg.poll_timeout_secs_or_default(),
        )
        .map_err(|e| anyhow::anyhow!("{}", e))?,
    );
    let updates: Arc<dyn UpdatesPort> = Arc::clone(&bot) as Arc<dyn UpdatesPort>;
    let chat: Arc<dyn ChatPort> = Arc::clone(&bot) as Arc<dyn ChatPort>;

    // --- Upstream sources ---
    let source: Arc<dyn SourcePort> = Arc::new(HttpSourceClient::new());
    let endpoints = cfg.endpoints();
    info!(
        news = %endpoints.news,
        region = %endpoints.region,
        region_id = cfg.region_id_or_default(),
        city = %cfg.weather_city_or_default(),
        "upstream endpoints configured"
    );

    let dispatcher: Arc<dyn MessageHandler> =
        Arc::new(Dispatcher::new(source, chat, counter, endpoints));

    let mut intake = IntakeService::new(updates, dispatcher);
    if let Some(max) = cfg.max_in_flight {
        info!(max_in_flight = max, "bounding concurrent message handling");
        intake = intake.with_max_in_flight(max);
    }

    // --- Run until Ctrl-C ---
    intake
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await;

    Ok(())
}
