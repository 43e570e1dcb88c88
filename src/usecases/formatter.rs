//! Render decoded digests and forecasts into Telegram Markdown text.

use crate::domain::commands::REGIONAL_NEWS_LABEL;
use crate::domain::{Item, NewsDigest, RegionDigest, WeatherForecast, WeatherPoint, Wind};

pub const WEATHER_HEADER: &str = "Погода в Сумах";

const DAY_LABEL_FORMAT: &str = "%d %B %Y";
const TIME_FORMAT: &str = "%H:%M";

/// Condition code -> glyph. Some glyphs carry a trailing space as padding.
const ICONS: [(&str, &str); 18] = [
    ("01d", "\u{2600}\u{fe0f}"),
    ("01n", "\u{1f319}"),
    ("02d", "\u{1f324} \u{fe0f}"),
    ("02n", "\u{1f319}"),
    ("03d", "\u{1f325} "),
    ("03n", "\u{2601}\u{fe0f}"),
    ("04d", "\u{2601}\u{fe0f}"),
    ("04n", "\u{2601}\u{fe0f}"),
    ("09d", "\u{1f327} \u{fe0f}"),
    ("09n", "\u{1f327} \u{fe0f}"),
    ("10d", "\u{1f326} "),
    ("10n", "\u{1f327} \u{fe0f}"),
    ("11d", "\u{1f329} "),
    ("11n", "\u{1f329} "),
    ("13d", "\u{2744}\u{fe0f}"),
    ("13n", "\u{2744}\u{fe0f}"),
    ("50d", "\u{1f32b} "),
    ("50n", "\u{1f32b} "),
];

/// Half-open sectors `[from, to)` in degrees. Anything else points down.
const WIND_SECTORS: [(f64, f64, &str); 7] = [
    (22.5, 67.5, "\u{2199}"),
    (67.5, 112.5, "\u{2b05}\u{fe0f}"),
    (112.5, 157.5, "\u{2196}"),
    (157.5, 202.5, "\u{2b06}"),
    (202.5, 247.5, "\u{2197}"),
    (247.5, 292.5, "\u{27a1}\u{fe0f}"),
    (292.5, 337.5, "\u{2198}\u{fe0f}"),
];
const WIND_NORTH: &str = "\u{2b07}";

/// Glyph for a condition code; empty for codes outside the table.
pub fn icon_for(code: &str) -> &'static str {
    ICONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|&(_, glyph)| glyph)
        .unwrap_or("")
}

/// Clear-sky glyph, also used as the reply to unrecognized commands.
pub fn clear_sky_icon() -> &'static str {
    icon_for("01d")
}

pub fn wind_arrow(deg: f64) -> &'static str {
    WIND_SECTORS
        .iter()
        .find(|(from, to, _)| deg >= *from && deg < *to)
        .map(|&(_, _, arrow)| arrow)
        .unwrap_or(WIND_NORTH)
}

/// `<arrow> <speed>м/с`, speed rounded to a whole number.
pub fn format_wind(wind: &Wind) -> String {
    format!("{} {:.0}м/с", wind_arrow(wind.deg), wind.speed)
}

/// Bold category titles, one bullet per item, a blank line between categories.
pub fn format_news_digest(digest: &NewsDigest) -> String {
    let mut message = String::new();
    for category in &digest.categories {
        message.push_str(&format!("*{}*\n", category.title));
        for item in &category.items {
            message.push_str(&item_line(item));
        }
        message.push('\n');
    }
    // Two removals: the blank separator and the last line break.
    trim_trailing_newlines(message, 2)
}

pub fn format_region_digest(digest: &RegionDigest) -> String {
    let mut message = format!("*{}*\n", REGIONAL_NEWS_LABEL);
    for item in &digest.items {
        message.push_str(&item_line(item));
    }
    trim_trailing_newlines(message, 1)
}

/// Header, then one line per forecast slot, with a bold day label before the
/// first slot of every local calendar day.
pub fn format_weather_forecast(forecast: &WeatherForecast) -> String {
    let mut message = format!("*{}*\n", WEATHER_HEADER);
    let mut day = String::new();
    for point in &forecast.points {
        let Some(local) = forecast.local_time(point) else {
            continue;
        };
        let label = local.format(DAY_LABEL_FORMAT).to_string();
        if label != day {
            message.push_str(&format!("*{}*\n", label));
            day = label;
        }
        message.push_str(&format!(
            "{} {}\n",
            local.format(TIME_FORMAT),
            point_line(point)
        ));
    }
    trim_trailing_newlines(message, 1)
}

fn item_line(item: &Item) -> String {
    format!("- {}. [More]({}).\n", item.title, item.url)
}

fn point_line(point: &WeatherPoint) -> String {
    format!(
        "*{:+}*℃ {} {} {}",
        point.temperature,
        icon_for(&point.icon),
        point.description,
        format_wind(&point.wind)
    )
}

/// Strip up to `count` trailing `\n`, one at a time, stopping at the first
/// non-newline character.
fn trim_trailing_newlines(mut text: String, count: usize) -> String {
    for _ in 0..count {
        if text.ends_with('\n') {
            text.pop();
        } else {
            break;
        }
    }
    text
}
