/// Send a single message to the configured Telegram chat
///
/// Text comes from `MESSAGE`, else `DEFAULT_MESSAGE`, else a fixed greeting.
use std::process::ExitCode;
use tracing::{error, info};
use volspike_notify::{
    Markup, Notifier, TelegramNotifier,
    config::{TelegramConfig, env_lookup, setting},
    init_logging,
};

const GREETING: &str = "굿모닝! 오늘도 좋은 하루 되세요 ☀️";

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let message = setting(&env_lookup, "MESSAGE")
        .or_else(|| setting(&env_lookup, "DEFAULT_MESSAGE"))
        .unwrap_or_else(|| GREETING.to_string());

    let result = match TelegramConfig::from_env().and_then(|config| TelegramNotifier::new(&config)) {
        Ok(notifier) => notifier
            .deliver(&message, Markup::Html)
            .await
            .map_err(|error| error.to_string()),
        Err(error) => Err(error.to_string()),
    };

    match result {
        Ok(()) => {
            info!(chars = message.chars().count(), "message sent");
            ExitCode::SUCCESS
        }
        Err(message) => {
            error!(%message, "send failed");
            eprintln!("ERROR: {message}");
            ExitCode::FAILURE
        }
    }
}
