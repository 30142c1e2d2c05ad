use std::{fmt, str::FromStr};
use thiserror::Error;
use url::Url;

/// Default Telegram Bot API base url.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Errors building configuration from settings.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Read `key` through `lookup`, treating blank values as unset.
pub fn setting<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Read and parse `key`, `None` when unset.
pub fn parsed_setting<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    setting(lookup, key)
        .map(|value| {
            value.parse::<T>().map_err(|error| ConfigError::Invalid {
                key,
                reason: error.to_string(),
                value,
            })
        })
        .transpose()
}

/// Read `key`, failing with [`ConfigError::Missing`] when unset.
pub fn required_setting<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    setting(lookup, key).ok_or(ConfigError::Missing(key))
}

/// Process environment lookup.
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Telegram delivery settings.
#[derive(Clone, PartialEq, Eq)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub api_base: Url,
}

impl TelegramConfig {
    pub const KEY_BOT_TOKEN: &'static str = "TELEGRAM_BOT_TOKEN";
    pub const KEY_CHAT_ID: &'static str = "TELEGRAM_CHAT_ID";
    pub const KEY_API_BASE: &'static str = "TELEGRAM_API_BASE";

    /// Build from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = required_setting(&lookup, Self::KEY_BOT_TOKEN)?;
        let chat_id = required_setting(&lookup, Self::KEY_CHAT_ID)?;
        let api_base = match parsed_setting::<_, Url>(&lookup, Self::KEY_API_BASE)? {
            Some(api_base) => api_base,
            None => Url::parse(DEFAULT_API_BASE).map_err(|error| ConfigError::Invalid {
                key: Self::KEY_API_BASE,
                value: DEFAULT_API_BASE.to_string(),
                reason: error.to_string(),
            })?,
        };

        Ok(Self {
            bot_token,
            chat_id,
            api_base,
        })
    }

    /// `sendMessage` endpoint for this bot.
    pub fn send_message_url(&self) -> Result<Url, ConfigError> {
        let base = self.api_base.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/bot{}/sendMessage", self.bot_token)).map_err(|error| {
            ConfigError::Invalid {
                key: Self::KEY_BOT_TOKEN,
                value: "<redacted>".to_string(),
                reason: error.to_string(),
            }
        })
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base.as_str())
            .finish()
    }
}
