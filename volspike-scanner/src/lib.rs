/// Volspike Scanner - Shared Library
///
/// This library provides the scan pipeline behind the report binaries:
/// - volume-spike: instruments ranked by spike multiple
/// - volume-spike-by-size: the same spikes ranked by market capitalisation
///
/// The library includes:
/// - Trading day resolution against a canary market
/// - Spike detection and ranking over two sessions' volume snapshots
/// - Chunked report rendering (Telegram HTML or plain text)
/// - Run orchestration with plain text fallback and failure alerts
pub mod shared;

// Re-export commonly used types for convenience
pub use shared::types::{
    DateSelection, InvalidOption, LineFormat, Markup, RankedReport, ReportPreset, SortKey,
    SpikeRecord,
};

pub use shared::calendar::{ComparisonDays, TradingDayResolver, weekday_shortcut};
pub use shared::config::{ConfigError, ScanConfig};
pub use shared::detector::{DetectorConfig, SpikeDetector, resolve_names, volume_ratio};
pub use shared::error::ScanError;
pub use shared::render::{ReportMetadata, ReportRenderer, pack_lines};

// Run orchestration (shared across all report binaries)
pub use shared::pipeline::{
    Delivery, RunOutcome, ScanReport, alert, build_report, deliver_report, run, run_cli,
};
