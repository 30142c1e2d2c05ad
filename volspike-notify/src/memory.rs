use crate::{Markup, Notifier, error::NotifyError};
use async_trait::async_trait;
use parking_lot::Mutex;

/// [`Notifier`] that records every delivered chunk.
///
/// Deliveries with a markup registered through [`InMemoryNotifier::failing_on`] are rejected
/// (and not recorded), which lets tests drive the plain text fallback.
#[derive(Debug, Default)]
pub struct InMemoryNotifier {
    delivered: Mutex<Vec<(String, Markup)>>,
    failing: Vec<Markup>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, markup: Markup) -> Self {
        self.failing.push(markup);
        self
    }

    /// Chunks delivered so far, in delivery order.
    pub fn delivered(&self) -> Vec<(String, Markup)> {
        self.delivered.lock().clone()
    }

    /// Text of the chunks delivered so far.
    pub fn texts(&self) -> Vec<String> {
        self.delivered
            .lock()
            .iter()
            .map(|(text, _)| text.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn deliver(&self, text: &str, markup: Markup) -> Result<(), NotifyError> {
        if self.failing.contains(&markup) {
            return Err(NotifyError::Api {
                code: Some(400),
                description: format!("Bad Request: {markup:?} delivery rejected"),
            });
        }

        self.delivered.lock().push((text.to_string(), markup));
        Ok(())
    }
}
