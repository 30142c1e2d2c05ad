use crate::shared::{
    calendar::{ComparisonDays, TradingDayResolver},
    config::ScanConfig,
    detector::{SpikeDetector, resolve_names},
    error::ScanError,
    render::ReportMetadata,
    types::{Markup, RankedReport, ReportPreset, SortKey},
};
use chrono::{DateTime, FixedOffset};
use futures::future::try_join;
use std::process::ExitCode;
use tracing::{error, info, warn};
use volspike_data::{
    error::DataError,
    fetcher::SnapshotFetcher,
    session::SessionDate,
    snapshot::{CapSnapshot, VolumeSnapshot},
    source::{KrxClient, MarketDataSource},
};
use volspike_notify::{Notifier, TelegramNotifier, config::TelegramConfig, error::NotifyError};

/// Detected report with its header context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub report: RankedReport,
    pub metadata: ReportMetadata,
}

/// How a report reached the chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Every chunk delivered with HTML markup
    Html { chunks: usize },
    /// HTML delivery failed, the plain text re-render was delivered
    PlainFallback { chunks: usize },
}

/// Result of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Weekend reference date under the weekday shortcut, nothing sent
    Skipped,
    Delivered(Delivery),
}

/// Resolve sessions, fetch, detect and name the spikes for a run at `now`.
///
/// `None` when there is no comparison for the reference date.
pub async fn build_report<Source>(
    config: &ScanConfig,
    fetcher: &SnapshotFetcher<Source>,
    now: DateTime<FixedOffset>,
) -> Result<Option<ScanReport>, ScanError>
where
    Source: MarketDataSource,
{
    let reference = config.reference_date(now);
    let resolver = TradingDayResolver::new(fetcher, config.canary);

    let Some(ComparisonDays { recent, prior }) = resolver
        .comparison_days(reference, config.date_selection, config.lookback_days)
        .await?
    else {
        return Ok(None);
    };

    let ((recent_volumes, caps), prior_volumes) = try_join(
        fetch_recent(config, fetcher, recent),
        fetcher.fetch_volumes_all(prior, &config.markets),
    )
    .await?;

    let detector = SpikeDetector::new(config.detector_config());
    let mut report = detector.detect(&recent_volumes, &prior_volumes, caps.as_ref());
    resolve_names(fetcher.source(), &mut report).await;

    let metadata = ReportMetadata {
        title: ReportMetadata::default_title(config.preset, &config.markets),
        recent,
        prior,
        threshold: config.threshold,
        sort_key: config.sort_key,
        selection: config.date_selection,
        generated_at: now,
    };

    Ok(Some(ScanReport { report, metadata }))
}

/// Recent session volumes, plus market caps when ranking by size.
async fn fetch_recent<Source>(
    config: &ScanConfig,
    fetcher: &SnapshotFetcher<Source>,
    recent: SessionDate,
) -> Result<(VolumeSnapshot, Option<CapSnapshot>), DataError>
where
    Source: MarketDataSource,
{
    match config.sort_key {
        SortKey::MarketCap => {
            let (volumes, caps) = fetcher
                .fetch_volumes_and_caps_all(recent, &config.markets)
                .await?;
            Ok((volumes, Some(caps)))
        }
        SortKey::Ratio => Ok((fetcher.fetch_volumes_all(recent, &config.markets).await?, None)),
    }
}

/// Deliver every rendered chunk as HTML, falling back to a plain text re-render.
///
/// All chunks are rendered before the first delivery.
pub async fn deliver_report<N>(
    notifier: &N,
    config: &ScanConfig,
    scan: &ScanReport,
) -> Result<Delivery, ScanError>
where
    N: Notifier,
{
    let chunks = config
        .renderer(Markup::Html)
        .render(&scan.report, &scan.metadata);

    let error = match deliver_all(notifier, &chunks, Markup::Html).await {
        Ok(()) => return Ok(Delivery::Html { chunks: chunks.len() }),
        Err(error) => error,
    };
    warn!(%error, "HTML delivery failed, retrying as plain text");

    let chunks = config
        .renderer(Markup::Plain)
        .render(&scan.report, &scan.metadata);
    deliver_all(notifier, &chunks, Markup::Plain).await?;

    Ok(Delivery::PlainFallback {
        chunks: chunks.len(),
    })
}

async fn deliver_all<N>(
    notifier: &N,
    chunks: &[String],
    markup: Markup,
) -> Result<(), NotifyError>
where
    N: Notifier,
{
    for chunk in chunks {
        notifier.deliver(chunk, markup).await?;
    }
    Ok(())
}

/// One full run: build the report and deliver it.
pub async fn run<Source, N>(
    config: &ScanConfig,
    source: Source,
    notifier: &N,
    now: DateTime<FixedOffset>,
) -> Result<RunOutcome, ScanError>
where
    Source: MarketDataSource,
    N: Notifier,
{
    let fetcher = SnapshotFetcher::new(source);

    let Some(scan) = build_report(config, &fetcher, now).await? else {
        info!("no comparison sessions for a weekend reference date, skipping");
        return Ok(RunOutcome::Skipped);
    };

    let delivery = deliver_report(notifier, config, &scan).await?;
    info!(
        recent = %scan.metadata.recent,
        prior = %scan.metadata.prior,
        rows = scan.report.len(),
        matches = scan.report.total_matches,
        ?delivery,
        "report delivered"
    );

    Ok(RunOutcome::Delivered(delivery))
}

/// Text of the run failure alert.
pub fn alert_text(error: &ScanError) -> String {
    format!("⚠️ 자동화 에러: {error}")
}

/// Best effort failure alert, a delivery error is only logged.
pub async fn alert<N>(notifier: &N, error: &ScanError)
where
    N: Notifier,
{
    if let Err(alert_error) = notifier.deliver(&alert_text(error), Markup::Plain).await {
        error!(%alert_error, "failed to deliver error alert");
    }
}

/// Entry point shared by the report binaries.
///
/// Configuration comes from the process environment. A failed run is alerted through the
/// notifier when one could be built, printed as `ERROR: ...` and exits with status 1.
pub async fn run_cli(preset: ReportPreset) -> ExitCode {
    let notifier = match TelegramConfig::from_env().and_then(|config| TelegramNotifier::new(&config)) {
        Ok(notifier) => notifier,
        Err(error) => return fail(ScanError::from(error)),
    };

    let result = async {
        let config = ScanConfig::from_env(preset)?;
        info!(?preset, ?config, "starting volume spike scan");
        let client = KrxClient::new(&config.krx_base_url)?;
        run(&config, client, &notifier, config.now()).await
    }
    .await;

    match result {
        Ok(outcome) => {
            info!(?outcome, "run finished");
            ExitCode::SUCCESS
        }
        Err(error) => {
            alert(&notifier, &error).await;
            fail(error)
        }
    }
}

fn fail(error: ScanError) -> ExitCode {
    error!(%error, "run failed");
    eprintln!("ERROR: {error}");
    ExitCode::FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;
    use volspike_data::market::Market;

    #[test]
    fn test_alert_text() {
        struct TestCase {
            input: ScanError,
            expected: &'static str,
        }

        let tests = vec![
            TestCase {
                // TC0: resolver failure
                input: ScanError::InsufficientTradingDays {
                    found: 0,
                    required: 2,
                    lookback: 14,
                },
                expected: "⚠️ 자동화 에러: found 0 of 2 required trading days within 14 days before the reference date",
            },
            TestCase {
                // TC1: delivery failure
                input: ScanError::from(NotifyError::Request("timed out".to_string())),
                expected: "⚠️ 자동화 에러: delivery: notification request failed: timed out",
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(alert_text(&test.input), test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_default_title_lists_configured_markets() {
        assert_eq!(
            ReportMetadata::default_title(ReportPreset::Size, &[Market::Kosdaq]),
            "KOSDAQ 거래량 급증 (시가총액 순)"
        );
    }
}
