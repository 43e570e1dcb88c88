//! Selective decoding of upstream JSON payloads into digests and forecasts.
//!
//! News and region payloads are read as an untyped `serde_json::Value` tree with
//! explicit, type-checked field access: the news feed mixes unrelated categories
//! under one array and only a few are wanted. The weather payload is parsed into
//! a strict serde shape because every field is consumed.
//!
//! Every decoder is fail-fast: the first missing key or wrong type aborts the
//! whole decode with `DomainError::Decode`.

use crate::domain::{
    Category, DomainError, Item, NewsDigest, RegionDigest, WeatherForecast, WeatherPoint, Wind,
};
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Upstream category ids that make it into the news digest.
pub const NEWS_CATEGORY_WHITELIST: [i64; 4] = [13, 7, 22, 4];

pub fn decode_news_digest(bytes: &[u8]) -> Result<NewsDigest, DomainError> {
    let root = parse_object(bytes)?;
    let mut categories = Vec::new();

    for entry in array_field(&root, "news")? {
        let entry = as_object(entry, "news[]")?;
        let id = number_field(entry, "id")?;
        if !is_whitelisted(id) {
            continue;
        }
        let title = string_field(entry, "title")?;
        let items = array_field(entry, "items")?
            .iter()
            .map(decode_item)
            .collect::<Result<Vec<_>, _>>()?;
        categories.push(Category { title, items });
    }

    Ok(NewsDigest { categories })
}

pub fn decode_region_digest(bytes: &[u8]) -> Result<RegionDigest, DomainError> {
    let root = parse_object(bytes)?;
    let items = array_field(&root, "region")?
        .iter()
        .map(decode_item)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RegionDigest { items })
}

pub fn decode_weather_forecast(bytes: &[u8]) -> Result<WeatherForecast, DomainError> {
    let raw: RawForecast = serde_json::from_slice(bytes)
        .map_err(|e| DomainError::Decode(format!("weather payload: {}", e)))?;

    let offset = FixedOffset::east_opt(raw.city.timezone).ok_or_else(|| {
        DomainError::Decode(format!("timezone offset out of range: {}", raw.city.timezone))
    })?;

    let points = raw
        .list
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            let condition = slot
                .weather
                .into_iter()
                .next()
                .ok_or_else(|| DomainError::Decode(format!("list[{}]: empty weather array", i)))?;
            if DateTime::from_timestamp(slot.dt, 0).is_none() {
                return Err(DomainError::Decode(format!(
                    "list[{}]: timestamp out of range: {}",
                    i, slot.dt
                )));
            }
            Ok(WeatherPoint {
                timestamp: slot.dt,
                // `as` truncates toward zero and saturates on overflow.
                temperature: slot.main.temp as i64,
                icon: condition.icon,
                description: condition.description,
                wind: Wind {
                    speed: slot.wind.speed,
                    deg: slot.wind.deg,
                },
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(WeatherForecast { offset, points })
}

fn is_whitelisted(id: f64) -> bool {
    NEWS_CATEGORY_WHITELIST.iter().any(|&w| w as f64 == id)
}

fn decode_item(value: &Value) -> Result<Item, DomainError> {
    let obj = as_object(value, "item")?;
    Ok(Item {
        title: string_field(obj, "title")?,
        url: string_field(obj, "url")?,
    })
}

fn parse_object(bytes: &[u8]) -> Result<Map<String, Value>, DomainError> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(DomainError::Decode("top level is not an object".into())),
        Err(e) => Err(DomainError::Decode(format!("invalid JSON: {}", e))),
    }
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>, DomainError> {
    value
        .as_object()
        .ok_or_else(|| DomainError::Decode(format!("{} is not an object", what)))
}

fn array_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a Vec<Value>, DomainError> {
    obj.get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| DomainError::Decode(format!("missing array `{}`", key)))
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Result<String, DomainError> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| DomainError::Decode(format!("missing string `{}`", key)))
}

fn number_field(obj: &Map<String, Value>, key: &str) -> Result<f64, DomainError> {
    obj.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| DomainError::Decode(format!("missing number `{}`", key)))
}

/// OpenWeatherMap 5 day / 3 hour forecast, only the fields we render.
#[derive(Deserialize)]
struct RawForecast {
    city: RawCity,
    list: Vec<RawSlot>,
}

#[derive(Deserialize)]
struct RawCity {
    /// Shift in seconds from UTC.
    timezone: i32,
}

#[derive(Deserialize)]
struct RawSlot {
    dt: i64,
    main: RawMain,
    weather: Vec<RawCondition>,
    wind: RawWind,
}

#[derive(Deserialize)]
struct RawMain {
    temp: f64,
}

#[derive(Deserialize)]
struct RawCondition {
    icon: String,
    description: String,
}

#[derive(Deserialize)]
struct RawWind {
    speed: f64,
    deg: f64,
}
