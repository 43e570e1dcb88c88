//! Fixed command table and reply keyboard.

use super::entities::ReplyKeyboard;

pub const START: &str = "/start";
pub const GLOBAL_NEWS_LABEL: &str = "Головні новини";
pub const REGIONAL_NEWS_LABEL: &str = "Новини Сумщини";
pub const WEATHER_LABEL: &str = "Погода";
/// Shown on the keyboard but has no handler; routes to the fallback reply.
pub const SETTINGS_LABEL: &str = "Налаштування";

/// Commands the dispatcher knows how to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    GlobalNews,
    RegionalNews,
    Weather,
}

const TABLE: &[(&str, Command)] = &[
    (START, Command::Start),
    (GLOBAL_NEWS_LABEL, Command::GlobalNews),
    (REGIONAL_NEWS_LABEL, Command::RegionalNews),
    (WEATHER_LABEL, Command::Weather),
];

impl Command {
    /// Exact match against the command table. No trimming, no case folding.
    pub fn classify(text: &str) -> Option<Command> {
        TABLE
            .iter()
            .find(|(label, _)| *label == text)
            .map(|&(_, cmd)| cmd)
    }
}

/// Two rows of shortcuts: news on top, weather and settings below.
pub fn main_keyboard() -> ReplyKeyboard {
    ReplyKeyboard {
        rows: vec![
            vec![GLOBAL_NEWS_LABEL.to_string(), REGIONAL_NEWS_LABEL.to_string()],
            vec![WEATHER_LABEL.to_string(), SETTINGS_LABEL.to_string()],
        ],
    }
}
