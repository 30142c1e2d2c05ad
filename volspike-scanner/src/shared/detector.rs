use crate::shared::types::{RankedReport, ReportPreset, SortKey, SpikeRecord};
use futures::{StreamExt, stream};
use rust_decimal::{Decimal, RoundingStrategy};
use std::cmp::Ordering;
use tracing::{debug, info, warn};
use volspike_data::{
    instrument::Instrument,
    snapshot::{CapSnapshot, VolumeSnapshot},
    source::MarketDataSource,
};

/// Default minimum spike multiple.
pub const DEFAULT_THRESHOLD: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Concurrent display name lookups.
const NAME_LOOKUP_CONCURRENCY: usize = 8;

/// Decimal places of a spike ratio.
const RATIO_SCALE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Minimum (inclusive) spike multiple
    pub threshold: Decimal,
    pub sort_key: SortKey,
    /// Maximum rows kept in the report
    pub max_rows: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::from_preset(ReportPreset::Spike)
    }
}

impl DetectorConfig {
    pub fn from_preset(preset: ReportPreset) -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            sort_key: preset.sort_key(),
            max_rows: preset.max_rows(),
        }
    }

    pub fn with_threshold(mut self, threshold: Decimal) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_sort_key(mut self, sort_key: SortKey) -> Self {
        self.sort_key = sort_key;
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }
}

/// `recent / prior` rounded to 2 decimal places (midpoint to even), `None` when `prior` is 0.
pub fn volume_ratio(recent: u64, prior: u64) -> Option<Decimal> {
    if prior == 0 {
        return None;
    }

    Decimal::from(recent)
        .checked_div(Decimal::from(prior))
        .map(|ratio| ratio.round_dp_with_strategy(RATIO_SCALE, RoundingStrategy::MidpointNearestEven))
}

/// Joins two sessions' volumes and ranks the instruments whose volume spiked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpikeDetector {
    config: DetectorConfig,
}

impl SpikeDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Rank every ticker present in both snapshots whose ratio meets the threshold.
    ///
    /// Market caps are only used for ranking, a ticker missing from `caps` ranks as 0.
    pub fn detect(
        &self,
        recent: &VolumeSnapshot,
        prior: &VolumeSnapshot,
        caps: Option<&CapSnapshot>,
    ) -> RankedReport {
        let mut joined = 0usize;
        let mut records = recent
            .iter()
            .filter_map(|(ticker, entry)| {
                let prior_volume = prior.value(ticker)?;
                joined += 1;
                let ratio = volume_ratio(entry.value, prior_volume)?;

                Some(SpikeRecord {
                    instrument: Instrument {
                        market_cap: caps.and_then(|caps| caps.value(ticker)),
                        ..Instrument::new(ticker.clone(), entry.market)
                    },
                    recent_volume: entry.value,
                    prior_volume,
                    ratio,
                })
            })
            .filter(|record| record.ratio >= self.config.threshold)
            .collect::<Vec<_>>();

        records.sort_by(|a, b| compare(self.config.sort_key, a, b));

        let total_matches = records.len();
        records.truncate(self.config.max_rows);

        info!(
            recent = %recent.session,
            prior = %prior.session,
            joined,
            matches = total_matches,
            kept = records.len(),
            threshold = %self.config.threshold,
            sort = self.config.sort_key.as_str(),
            "detected volume spikes"
        );

        RankedReport {
            records,
            total_matches,
        }
    }
}

/// Total order for `sort_key`; ties fall back to recent volume desc, then ticker asc.
fn compare(sort_key: SortKey, a: &SpikeRecord, b: &SpikeRecord) -> Ordering {
    let primary = match sort_key {
        SortKey::Ratio => b.ratio.cmp(&a.ratio),
        SortKey::MarketCap => b.rank_cap().cmp(&a.rank_cap()),
    };

    primary
        .then_with(|| b.recent_volume.cmp(&a.recent_volume))
        .then_with(|| a.ticker().cmp(b.ticker()))
}

/// Fill in display names for the records kept in `report`.
///
/// A failed lookup leaves the name empty.
pub async fn resolve_names<Source>(source: &Source, report: &mut RankedReport)
where
    Source: MarketDataSource,
{
    let names = stream::iter(report.records.iter())
        .map(|record| async move {
            match source.instrument_name(record.ticker()).await {
                Ok(name) => name,
                Err(error) => {
                    warn!(ticker = %record.ticker(), %error, "instrument name lookup failed");
                    String::new()
                }
            }
        })
        .buffered(NAME_LOOKUP_CONCURRENCY)
        .collect::<Vec<_>>()
        .await;

    let resolved = names.iter().filter(|name| !name.is_empty()).count();
    for (record, name) in report.records.iter_mut().zip(names) {
        record.instrument.name = name;
    }

    debug!(resolved, total = report.records.len(), "resolved instrument names");
}
