use crate::shared::{error::ScanError, types::DateSelection};
use chrono::Weekday;
use tracing::{debug, info, warn};
use volspike_data::{
    error::DataError, fetcher::SnapshotFetcher, market::Market, session::SessionDate,
    source::MarketDataSource,
};

/// Default number of calendar days probed before giving up.
pub const DEFAULT_LOOKBACK_DAYS: u64 = 14;

/// The two sessions a scan compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonDays {
    /// More recent session ("전일")
    pub recent: SessionDate,
    /// Older session ("전전일")
    pub prior: SessionDate,
}

/// Weekday rule for the two sessions preceding `reference`, `None` on a weekend.
///
/// Monday compares Friday with Thursday, Tuesday compares Monday with Friday, Wednesday to
/// Friday compare the two preceding weekdays.
pub fn weekday_shortcut(reference: SessionDate) -> Option<ComparisonDays> {
    let (recent, prior) = match reference.weekday() {
        Weekday::Mon => (3, 4),
        Weekday::Tue => (1, 4),
        Weekday::Wed | Weekday::Thu | Weekday::Fri => (1, 2),
        Weekday::Sat | Weekday::Sun => return None,
    };

    Some(ComparisonDays {
        recent: reference.days_before(recent)?,
        prior: reference.days_before(prior)?,
    })
}

/// Finds recent trading sessions by probing the canary market for data.
#[derive(Debug)]
pub struct TradingDayResolver<'a, Source> {
    fetcher: &'a SnapshotFetcher<Source>,
    canary: Market,
}

impl<'a, Source> TradingDayResolver<'a, Source>
where
    Source: MarketDataSource,
{
    pub fn new(fetcher: &'a SnapshotFetcher<Source>, canary: Market) -> Self {
        Self { fetcher, canary }
    }

    /// `true` if the canary market has volume data for `session`.
    pub async fn is_trading_day(&self, session: SessionDate) -> Result<bool, DataError> {
        let snapshot = self.fetcher.fetch_volumes(session, self.canary).await?;
        debug!(%session, canary = %self.canary, instruments = snapshot.len(), "probed session");
        Ok(!snapshot.is_empty())
    }

    /// Up to `count` trading days strictly before `reference`, most recent first.
    ///
    /// Weekends are skipped without a request but still count toward `lookback`.
    pub async fn resolve(
        &self,
        reference: SessionDate,
        count: usize,
        lookback: u64,
    ) -> Result<Vec<SessionDate>, ScanError> {
        let mut sessions = Vec::with_capacity(count);

        for offset in 1..=lookback {
            if sessions.len() >= count {
                break;
            }
            let Some(candidate) = reference.days_before(offset) else {
                break;
            };
            if candidate.is_weekend() {
                continue;
            }
            if self.is_trading_day(candidate).await? {
                sessions.push(candidate);
            }
        }

        if sessions.len() < count {
            return Err(ScanError::InsufficientTradingDays {
                found: sessions.len(),
                required: count,
                lookback,
            });
        }

        Ok(sessions)
    }

    /// The two sessions to compare for a run on `reference`.
    ///
    /// `None` only for a weekend reference under [`DateSelection::WeekdayShortcut`]. Shortcut
    /// dates without canary data fall back to probing.
    pub async fn comparison_days(
        &self,
        reference: SessionDate,
        selection: DateSelection,
        lookback: u64,
    ) -> Result<Option<ComparisonDays>, ScanError> {
        if selection == DateSelection::WeekdayShortcut {
            let Some(days) = weekday_shortcut(reference) else {
                info!(%reference, "weekend reference date, no comparison");
                return Ok(None);
            };

            if self.is_trading_day(days.recent).await? && self.is_trading_day(days.prior).await? {
                info!(%reference, recent = %days.recent, prior = %days.prior, "weekday shortcut sessions");
                return Ok(Some(days));
            }

            warn!(
                %reference,
                recent = %days.recent,
                prior = %days.prior,
                "weekday shortcut session has no data, falling back to probing"
            );
        }

        match self.resolve(reference, 2, lookback).await?.as_slice() {
            [recent, prior] => {
                info!(%reference, %recent, %prior, "probed sessions");
                Ok(Some(ComparisonDays {
                    recent: *recent,
                    prior: *prior,
                }))
            }
            sessions => Err(ScanError::InsufficientTradingDays {
                found: sessions.len(),
                required: 2,
                lookback,
            }),
        }
    }
}
