use crate::{
    error::DataError, instrument::Ticker, market::Market, session::SessionDate,
    snapshot::RawSnapshot,
};
use async_trait::async_trait;

/// [`MarketDataSource`] backed by the KRX data portal.
pub mod krx;

/// Fixture backed [`MarketDataSource`] for tests and offline runs.
pub mod memory;

pub use krx::KrxClient;
pub use memory::InMemorySource;

/// Provider of raw daily market data.
///
/// Implementations return the rows exactly as the provider delivers them; normalisation and
/// validation happen in [`Snapshot::from_raw`](crate::snapshot::Snapshot::from_raw).
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Per-instrument daily rows (ticker, volume, market cap, ...) for a session & market.
    ///
    /// A date without trading must yield an empty [`RawSnapshot`], not an error.
    async fn daily_snapshot(
        &self,
        session: SessionDate,
        market: Market,
    ) -> Result<RawSnapshot, DataError>;

    /// Display name of an instrument. May fail per ticker.
    async fn instrument_name(&self, ticker: &Ticker) -> Result<String, DataError>;
}

#[async_trait]
impl<T> MarketDataSource for &T
where
    T: MarketDataSource + ?Sized,
{
    async fn daily_snapshot(
        &self,
        session: SessionDate,
        market: Market,
    ) -> Result<RawSnapshot, DataError> {
        (**self).daily_snapshot(session, market).await
    }

    async fn instrument_name(&self, ticker: &Ticker) -> Result<String, DataError> {
        (**self).instrument_name(ticker).await
    }
}
