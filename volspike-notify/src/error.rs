use thiserror::Error;

/// All errors generated while delivering a chunk.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Request(String),

    #[error("notification endpoint responded with HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("notification rejected{}: {description}", code_suffix(.code))]
    Api {
        code: Option<i64>,
        description: String,
    },

    #[error("failed to decode notification response: {0}")]
    Decode(String),
}

fn code_suffix(code: &Option<i64>) -> String {
    code.map(|code| format!(" ({code})")).unwrap_or_default()
}

/// Strips the request url (it embeds the bot token).
impl From<reqwest::Error> for NotifyError {
    fn from(error: reqwest::Error) -> Self {
        let status = error.status();
        let error = error.without_url();
        match status {
            Some(status) => Self::Status {
                status: status.as_u16(),
                body: error.to_string(),
            },
            None => Self::Request(error.to_string()),
        }
    }
}
