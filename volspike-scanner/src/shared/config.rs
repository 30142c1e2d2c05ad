use crate::shared::{
    calendar::DEFAULT_LOOKBACK_DAYS,
    detector::{DEFAULT_THRESHOLD, DetectorConfig},
    render::{DEFAULT_MAX_CHUNK_LEN, ReportRenderer},
    types::{DateSelection, LineFormat, Markup, ReportPreset, SortKey},
};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use rust_decimal::Decimal;
use volspike_data::{market::Market, session::SessionDate, source::krx::BASE_URL_KRX};
use volspike_notify::config::{env_lookup, parsed_setting, setting};

pub use volspike_notify::config::ConfigError;

pub const KEY_MARKETS: &str = "VOLSPIKE_MARKETS";
pub const KEY_CANARY_MARKET: &str = "VOLSPIKE_CANARY_MARKET";
pub const KEY_THRESHOLD: &str = "VOLSPIKE_THRESHOLD";
pub const KEY_MAX_ROWS: &str = "VOLSPIKE_MAX_ROWS";
pub const KEY_MAX_CHUNK_LEN: &str = "VOLSPIKE_MAX_CHUNK_LEN";
pub const KEY_DATE_MODE: &str = "VOLSPIKE_DATE_MODE";
pub const KEY_LOOKBACK_DAYS: &str = "VOLSPIKE_LOOKBACK_DAYS";
pub const KEY_UTC_OFFSET_HOURS: &str = "VOLSPIKE_UTC_OFFSET_HOURS";
pub const KEY_REFERENCE_DATE: &str = "VOLSPIKE_REFERENCE_DATE";
pub const KEY_SORT: &str = "VOLSPIKE_SORT";
pub const KEY_LINE_FORMAT: &str = "VOLSPIKE_LINE_FORMAT";
pub const KEY_KRX_BASE_URL: &str = "KRX_BASE_URL";

/// Korea Standard Time, UTC+9.
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;

/// Scan settings, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub preset: ReportPreset,
    pub markets: Vec<Market>,
    /// Market probed to decide whether a date was a trading day
    pub canary: Market,
    pub threshold: Decimal,
    pub max_rows: usize,
    pub max_chunk_len: usize,
    pub date_selection: DateSelection,
    pub lookback_days: u64,
    pub utc_offset: FixedOffset,
    /// Fixed reference date, otherwise "today" in `utc_offset`
    pub reference_date: Option<SessionDate>,
    pub sort_key: SortKey,
    pub line_format: LineFormat,
    pub krx_base_url: String,
}

impl ScanConfig {
    /// Defaults for `preset`.
    pub fn new(preset: ReportPreset) -> Self {
        Self {
            preset,
            markets: Market::ALL.to_vec(),
            canary: Market::Kospi,
            threshold: DEFAULT_THRESHOLD,
            max_rows: preset.max_rows(),
            max_chunk_len: DEFAULT_MAX_CHUNK_LEN,
            date_selection: DateSelection::Probe,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            utc_offset: kst(),
            reference_date: None,
            sort_key: preset.sort_key(),
            line_format: preset.line_format(),
            krx_base_url: BASE_URL_KRX.to_string(),
        }
    }

    /// Build from the process environment.
    pub fn from_env(preset: ReportPreset) -> Result<Self, ConfigError> {
        Self::from_lookup(preset, env_lookup)
    }

    /// Build from an arbitrary key lookup, blank values count as unset.
    pub fn from_lookup<F>(preset: ReportPreset, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(preset);

        if let Some(markets) = setting(&lookup, KEY_MARKETS) {
            config.markets = parse_markets(&markets)?;
        }
        if let Some(canary) = parsed_setting(&lookup, KEY_CANARY_MARKET)? {
            config.canary = canary;
        }
        if let Some(threshold) = parsed_setting::<_, Decimal>(&lookup, KEY_THRESHOLD)? {
            if threshold <= Decimal::ZERO {
                return Err(invalid(KEY_THRESHOLD, threshold, "must be positive"));
            }
            config.threshold = threshold;
        }
        if let Some(max_rows) = parsed_setting::<_, usize>(&lookup, KEY_MAX_ROWS)? {
            if max_rows == 0 {
                return Err(invalid(KEY_MAX_ROWS, max_rows, "must be at least 1"));
            }
            config.max_rows = max_rows;
        }
        if let Some(max_chunk_len) = parsed_setting::<_, usize>(&lookup, KEY_MAX_CHUNK_LEN)? {
            if max_chunk_len == 0 {
                return Err(invalid(KEY_MAX_CHUNK_LEN, max_chunk_len, "must be at least 1"));
            }
            config.max_chunk_len = max_chunk_len;
        }
        if let Some(selection) = parsed_setting(&lookup, KEY_DATE_MODE)? {
            config.date_selection = selection;
        }
        if let Some(lookback_days) = parsed_setting::<_, u64>(&lookup, KEY_LOOKBACK_DAYS)? {
            if lookback_days == 0 {
                return Err(invalid(KEY_LOOKBACK_DAYS, lookback_days, "must be at least 1"));
            }
            config.lookback_days = lookback_days;
        }
        if let Some(hours) = parsed_setting::<_, i32>(&lookup, KEY_UTC_OFFSET_HOURS)? {
            config.utc_offset = hours
                .checked_mul(3600)
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| invalid(KEY_UTC_OFFSET_HOURS, hours, "out of range"))?;
        }
        if let Some(reference_date) = parsed_setting(&lookup, KEY_REFERENCE_DATE)? {
            config.reference_date = Some(reference_date);
        }
        if let Some(sort_key) = parsed_setting(&lookup, KEY_SORT)? {
            config.sort_key = sort_key;
        }
        if let Some(line_format) = parsed_setting(&lookup, KEY_LINE_FORMAT)? {
            config.line_format = line_format;
        }
        if let Some(krx_base_url) = setting(&lookup, KEY_KRX_BASE_URL) {
            config.krx_base_url = krx_base_url;
        }

        Ok(config)
    }

    /// Current time in the reference time zone.
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.utc_offset)
    }

    /// Configured reference date, else the calendar date of `now`.
    pub fn reference_date(&self, now: DateTime<FixedOffset>) -> SessionDate {
        self.reference_date
            .unwrap_or_else(|| SessionDate::from(now.date_naive()))
    }

    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig::from_preset(self.preset)
            .with_threshold(self.threshold)
            .with_sort_key(self.sort_key)
            .with_max_rows(self.max_rows)
    }

    pub fn renderer(&self, markup: Markup) -> ReportRenderer {
        ReportRenderer::default()
            .with_max_chunk_len(self.max_chunk_len)
            .with_line_format(self.line_format)
            .with_markup(markup)
    }
}

fn kst() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_UTC_OFFSET_HOURS * 3600).unwrap_or_else(|| Utc.fix())
}

fn invalid(key: &'static str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Comma separated markets, deduplicated in order.
fn parse_markets(input: &str) -> Result<Vec<Market>, ConfigError> {
    let mut markets = Vec::new();
    for part in input.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let market = part
            .parse::<Market>()
            .map_err(|error| invalid(KEY_MARKETS, input, &error.to_string()))?;
        if !markets.contains(&market) {
            markets.push(market);
        }
    }

    if markets.is_empty() {
        return Err(invalid(KEY_MARKETS, input, "no market given"));
    }
    Ok(markets)
}
