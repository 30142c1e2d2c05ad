/// Core types for a volume spike scan
///
/// A scan joins two sessions' volume snapshots into [`SpikeRecord`]s, keeps the ones over the
/// ratio threshold and ranks them into a [`RankedReport`]. The enums below select the
/// strategy of each pipeline stage.
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;
use volspike_data::{
    instrument::{Instrument, Ticker},
    market::Market,
};

pub use volspike_notify::Markup;

/// Instrument whose recent session volume is compared against the prior session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpikeRecord {
    /// Ticker, market, display name (may be empty) and optional market cap
    pub instrument: Instrument,
    /// Traded volume of the more recent session
    pub recent_volume: u64,
    /// Traded volume of the older session, always > 0
    pub prior_volume: u64,
    /// `recent_volume / prior_volume` rounded to 2 decimal places
    pub ratio: Decimal,
}

impl SpikeRecord {
    pub fn ticker(&self) -> &Ticker {
        &self.instrument.ticker
    }

    pub fn market(&self) -> Market {
        self.instrument.market
    }

    pub fn name(&self) -> &str {
        &self.instrument.name
    }

    /// Market cap used for ranking, missing caps rank as 0
    pub fn rank_cap(&self) -> u64 {
        self.instrument.market_cap.unwrap_or(0)
    }
}

/// Ranked, truncated result of a scan
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RankedReport {
    /// Records kept after truncation, in rank order
    pub records: Vec<SpikeRecord>,
    /// Number of records that met the threshold before truncation
    pub total_matches: usize,
}

impl RankedReport {
    /// Number of matching records not kept in the report
    pub fn omitted(&self) -> usize {
        self.total_matches.saturating_sub(self.records.len())
    }

    pub fn is_truncated(&self) -> bool {
        self.omitted() > 0
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Unrecognised value for one of the strategy options
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {option}: '{value}' (expected one of: {expected})")]
pub struct InvalidOption {
    pub option: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Ranking order of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// ratio desc, recent volume desc, ticker asc
    Ratio,
    /// market cap desc, recent volume desc, ticker asc
    MarketCap,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Ratio => "ratio",
            SortKey::MarketCap => "cap",
        }
    }

    /// Report header description
    pub fn description(&self) -> &'static str {
        match self {
            SortKey::Ratio => "배수 높은 순",
            SortKey::MarketCap => "시가총액 큰 순",
        }
    }
}

impl FromStr for SortKey {
    type Err = InvalidOption;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "ratio" => Ok(SortKey::Ratio),
            "cap" | "market_cap" | "size" => Ok(SortKey::MarketCap),
            _ => Err(InvalidOption {
                option: "sort key",
                value: input.to_string(),
                expected: "ratio, cap",
            }),
        }
    }
}

/// Per record line layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFormat {
    /// rank, ticker, name, market, ratio, both volumes
    Verbose,
    /// rank, name, recent volume, column aligned by display width
    Compact,
}

impl FromStr for LineFormat {
    type Err = InvalidOption;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "verbose" => Ok(LineFormat::Verbose),
            "compact" | "aligned" => Ok(LineFormat::Compact),
            _ => Err(InvalidOption {
                option: "line format",
                value: input.to_string(),
                expected: "verbose, compact",
            }),
        }
    }
}

/// How the two comparison sessions are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSelection {
    /// Probe backwards for sessions with canary market data
    Probe,
    /// Fixed weekday rules, verified against the canary market
    WeekdayShortcut,
}

impl DateSelection {
    /// Report header note
    pub fn description(&self) -> &'static str {
        match self {
            DateSelection::Probe => "(직전 거래일 2개 자동 탐색)",
            DateSelection::WeekdayShortcut => "(주말 미전송, 월요일은 금↔목 비교)",
        }
    }
}

impl FromStr for DateSelection {
    type Err = InvalidOption;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "probe" => Ok(DateSelection::Probe),
            "weekday" | "shortcut" => Ok(DateSelection::WeekdayShortcut),
            _ => Err(InvalidOption {
                option: "date mode",
                value: input.to_string(),
                expected: "probe, weekday",
            }),
        }
    }
}

/// Bundled defaults for each report binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPreset {
    /// Biggest multiples first, verbose lines
    Spike,
    /// Largest companies first, compact aligned lines
    Size,
}

impl ReportPreset {
    pub fn sort_key(&self) -> SortKey {
        match self {
            ReportPreset::Spike => SortKey::Ratio,
            ReportPreset::Size => SortKey::MarketCap,
        }
    }

    pub fn line_format(&self) -> LineFormat {
        match self {
            ReportPreset::Spike => LineFormat::Verbose,
            ReportPreset::Size => LineFormat::Compact,
        }
    }

    pub fn max_rows(&self) -> usize {
        match self {
            ReportPreset::Spike => 80,
            ReportPreset::Size => 30,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportPreset::Spike => "거래량 급증 리스트",
            ReportPreset::Size => "거래량 급증 (시가총액 순)",
        }
    }
}
