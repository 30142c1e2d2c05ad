use super::MarketDataSource;
use crate::{
    error::DataError,
    instrument::Ticker,
    market::Market,
    schema,
    session::SessionDate,
    snapshot::{RawRow, RawSnapshot},
};
use async_trait::async_trait;
use fnv::{FnvHashMap, FnvHashSet};
use parking_lot::Mutex;
use serde_json::Value;

/// [`MarketDataSource`] serving fixed rows from memory.
///
/// Rows are stored with the canonical KRX keys. Every `daily_snapshot` request is recorded so
/// callers can assert which sessions were actually probed.
#[derive(Debug, Default)]
pub struct InMemorySource {
    snapshots: FnvHashMap<(SessionDate, Market), RawSnapshot>,
    names: FnvHashMap<Ticker, String>,
    failing: FnvHashSet<(SessionDate, Market)>,
    requests: Mutex<Vec<(SessionDate, Market)>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the raw rows served for a session & market.
    pub fn with_rows(mut self, session: SessionDate, market: Market, rows: Vec<RawRow>) -> Self {
        self.snapshots.insert((session, market), RawSnapshot::new(rows));
        self
    }

    /// Set traded volumes for the given tickers.
    pub fn with_volumes(self, session: SessionDate, market: Market, volumes: &[(&str, u64)]) -> Self {
        volumes.iter().fold(self, |source, (ticker, volume)| {
            source.with_field(session, market, ticker, schema::VOLUME.canonical, Value::from(*volume))
        })
    }

    /// Set market capitalisations for the given tickers.
    pub fn with_caps(self, session: SessionDate, market: Market, caps: &[(&str, u64)]) -> Self {
        caps.iter().fold(self, |source, (ticker, cap)| {
            source.with_field(session, market, ticker, schema::MARKET_CAP.canonical, Value::from(*cap))
        })
    }

    /// Register a display name served by [`MarketDataSource::instrument_name`].
    pub fn with_name(mut self, ticker: &str, name: &str) -> Self {
        self.names.insert(Ticker::new(ticker), name.to_string());
        self
    }

    /// Make requests for a session & market fail as if the source were unreachable.
    pub fn with_failure(mut self, session: SessionDate, market: Market) -> Self {
        self.failing.insert((session, market));
        self
    }

    /// Upsert a single field of the row for `ticker`.
    pub fn with_field(
        mut self,
        session: SessionDate,
        market: Market,
        ticker: &str,
        key: &str,
        value: Value,
    ) -> Self {
        let rows = &mut self.snapshots.entry((session, market)).or_default().rows;

        let position = rows.iter().position(|row| {
            row.get(schema::TICKER.canonical).and_then(Value::as_str) == Some(ticker)
        });
        let index = match position {
            Some(index) => index,
            None => {
                let mut row = RawRow::new();
                row.insert(schema::TICKER.canonical.to_string(), Value::from(ticker));
                rows.push(row);
                rows.len() - 1
            }
        };
        rows[index].insert(key.to_string(), value);

        self
    }

    /// Every `daily_snapshot` request received so far, in order.
    pub fn requests(&self) -> Vec<(SessionDate, Market)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl MarketDataSource for InMemorySource {
    async fn daily_snapshot(
        &self,
        session: SessionDate,
        market: Market,
    ) -> Result<RawSnapshot, DataError> {
        self.requests.lock().push((session, market));

        if self.failing.contains(&(session, market)) {
            return Err(DataError::Request(format!(
                "in-memory source configured to fail for {market} on {session}"
            )));
        }

        Ok(self
            .snapshots
            .get(&(session, market))
            .cloned()
            .unwrap_or_default())
    }

    async fn instrument_name(&self, ticker: &Ticker) -> Result<String, DataError> {
        self.names
            .get(ticker)
            .cloned()
            .ok_or_else(|| DataError::NameUnavailable(ticker.clone()))
    }
}
