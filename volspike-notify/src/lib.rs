//! # Volspike-Notify
//! Delivery of rendered report chunks to a chat channel.
//!
//! A [`Notifier`] delivers one text chunk at a time with a given [`Markup`]. The
//! [`TelegramNotifier`] posts to the Telegram Bot API, the [`InMemoryNotifier`] records
//! deliveries for tests & dry runs.

/// All [`Error`](std::error::Error)s generated in Volspike-Notify.
pub mod error;

/// Settings lookup shared by every volspike binary, and the [`TelegramConfig`](config::TelegramConfig).
pub mod config;

/// [`Notifier`] backed by the Telegram Bot API.
pub mod telegram;

/// [`Notifier`] that records deliveries in memory.
pub mod memory;

pub use memory::InMemoryNotifier;
pub use telegram::TelegramNotifier;

use async_trait::async_trait;
use error::NotifyError;

/// Text markup a chunk is delivered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Markup {
    /// Telegram HTML subset (`<b>`, `<code>`, escaped text).
    Html,
    /// Plain text, no parse mode.
    Plain,
}

/// Delivers text chunks to a chat channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, text: &str, markup: Markup) -> Result<(), NotifyError>;
}

#[async_trait]
impl<T> Notifier for &T
where
    T: Notifier + ?Sized,
{
    async fn deliver(&self, text: &str, markup: Markup) -> Result<(), NotifyError> {
        (**self).deliver(text, markup).await
    }
}

/// Install a `tracing` fmt subscriber filtered by `RUST_LOG`, defaulting to `info`.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
