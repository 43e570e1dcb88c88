//! Application configuration. Bot credentials, upstream endpoints, paths.

use crate::domain::DomainError;
use crate::usecases::Endpoints;
use serde::Deserialize;

pub const DEFAULT_NEWS_URL: &str = "https://www.ukr.net/ajax/news.json";
pub const DEFAULT_REGIONS_URL: &str = "https://www.ukr.net/ajax/regions.json";
pub const DEFAULT_FORECAST_URL: &str = "http://api.openweathermap.org/data/2.5/forecast";
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Sumy oblast on ukr.net.
pub const DEFAULT_REGION_ID: u32 = 18;
pub const DEFAULT_WEATHER_CITY: &str = "sumy";
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Bot API token. Read from NEWS_BOT_BOT_TOKEN or TOKEN.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// OpenWeatherMap API key. Read from NEWS_BOT_WEATHER_API_KEY or WEATHER_TOKEN.
    #[serde(default)]
    pub weather_api_key: Option<String>,

    #[serde(default)]
    pub data_dir: Option<String>,

    /// ukr.net region id for the regional digest.
    #[serde(default)]
    pub region_id: Option<u32>,

    /// City name passed to the forecast API.
    #[serde(default)]
    pub weather_city: Option<String>,

    #[serde(default)]
    pub news_url: Option<String>,

    #[serde(default)]
    pub regions_url: Option<String>,

    #[serde(default)]
    pub forecast_url: Option<String>,

    #[serde(default)]
    pub telegram_api_url: Option<String>,

    /// Long-poll timeout for getUpdates, seconds.
    #[serde(default)]
    pub poll_timeout_secs: Option<u64>,

    /// Cap on messages handled concurrently. Unset = unbounded.
    #[serde(default)]
    pub max_in_flight: Option<usize>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("NEWS_BOT"));
        if let Ok(path) = std::env::var("NEWS_BOT_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        let mut cfg: Self = c.build()?.try_deserialize()?;
        // TOKEN and WEATHER_TOKEN are read without prefix so existing .env files keep working
        if cfg.bot_token.is_none() {
            cfg.bot_token = std::env::var("TOKEN").ok();
        }
        if cfg.weather_api_key.is_none() {
            cfg.weather_api_key = std::env::var("WEATHER_TOKEN").ok();
        }
        Ok(cfg)
    }

    /// Returns the bot token, or a Config error if it is missing or blank.
    pub fn bot_token(&self) -> Result<String, DomainError> {
        self.bot_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                DomainError::Config("Set NEWS_BOT_BOT_TOKEN (or TOKEN) in env or .env".into())
            })
    }

    pub fn data_dir_or_default(&self) -> String {
        self.data_dir.clone().unwrap_or_else(|| "./data".to_string())
    }

    pub fn region_id_or_default(&self) -> u32 {
        self.region_id.unwrap_or(DEFAULT_REGION_ID)
    }

    pub fn weather_city_or_default(&self) -> String {
        self.weather_city
            .clone()
            .unwrap_or_else(|| DEFAULT_WEATHER_CITY.to_string())
    }

    pub fn telegram_api_url_or_default(&self) -> String {
        self.telegram_api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string())
    }

    /// Returns getUpdates long-poll timeout in seconds. Defaults to 60.
    pub fn poll_timeout_secs_or_default(&self) -> u64 {
        self.poll_timeout_secs.unwrap_or(DEFAULT_POLL_TIMEOUT_SECS)
    }

    /// Returns true if a weather API key is present. Without one the forecast
    /// endpoint answers 401 and users get the apology.
    pub fn is_weather_configured(&self) -> bool {
        self.weather_api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    /// Build the three upstream URLs.
    pub fn endpoints(&self) -> Endpoints {
        let news = self
            .news_url
            .clone()
            .unwrap_or_else(|| DEFAULT_NEWS_URL.to_string());
        let regions = self.regions_url.as_deref().unwrap_or(DEFAULT_REGIONS_URL);
        let forecast = self.forecast_url.as_deref().unwrap_or(DEFAULT_FORECAST_URL);
        Endpoints {
            news,
            region: format!("{}?snr={}", regions, self.region_id_or_default()),
            weather: format!(
                "{}?q={}&units=metric&lang=ua&appid={}",
                forecast,
                self.weather_city_or_default(),
                self.weather_api_key.as_deref().unwrap_or_default()
            ),
        }
    }
}
