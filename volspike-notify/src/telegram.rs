use crate::{
    Markup, Notifier,
    config::{ConfigError, TelegramConfig},
    error::NotifyError,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::{fmt, time::Duration};
use tracing::debug;
use url::Url;

/// Per request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest message text the Bot API accepts, in characters.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Bot API reply envelope.
///
/// ### Raw Payload Examples
/// ```json
/// {"ok": true, "result": {"message_id": 42}}
/// ```
/// ```json
/// {"ok": false, "error_code": 400, "description": "Bad Request: chat not found"}
/// ```
#[derive(Debug, Deserialize)]
struct TelegramReply {
    ok: bool,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

/// [`Notifier`] posting `sendMessage` requests to the Telegram Bot API.
pub struct TelegramNotifier {
    http: reqwest::Client,
    endpoint: Url,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self, ConfigError> {
        let endpoint = config.send_message_url()?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| ConfigError::Invalid {
                key: TelegramConfig::KEY_API_BASE,
                value: config.api_base.to_string(),
                reason: error.to_string(),
            })?;

        Ok(Self {
            http,
            endpoint,
            chat_id: config.chat_id.clone(),
        })
    }
}

impl fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

/// Form fields of a `sendMessage` request.
fn send_message_form<'a>(chat_id: &'a str, text: &'a str, markup: Markup) -> Vec<(&'a str, &'a str)> {
    let mut form = vec![("chat_id", chat_id), ("text", text)];
    if markup == Markup::Html {
        form.push(("parse_mode", "HTML"));
    }
    form.push(("disable_web_page_preview", "true"));
    form
}

/// Classify a Bot API response.
fn interpret_reply(status: u16, body: &str) -> Result<(), NotifyError> {
    match serde_json::from_str::<TelegramReply>(body) {
        Ok(reply) if reply.ok => Ok(()),
        Ok(reply) => Err(NotifyError::Api {
            code: reply.error_code,
            description: reply.description.unwrap_or_default(),
        }),
        Err(_) if !(200..300).contains(&status) => Err(NotifyError::Status {
            status,
            body: body.to_string(),
        }),
        Err(error) => Err(NotifyError::Decode(error.to_string())),
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(&self, text: &str, markup: Markup) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .form(&send_message_form(&self.chat_id, text, markup))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, chars = text.chars().count(), ?markup, "telegram sendMessage");

        interpret_reply(status, &body)
    }
}
