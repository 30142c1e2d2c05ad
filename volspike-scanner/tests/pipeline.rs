use chrono::{DateTime, FixedOffset, TimeZone};
use volspike_data::{market::Market, session::SessionDate, source::InMemorySource};
use volspike_notify::{InMemoryNotifier, Markup};
use volspike_scanner::{
    DateSelection, Delivery, ReportPreset, RunOutcome, ScanConfig, ScanError, alert, run,
};

fn date(year: i32, month: u32, day: u32) -> SessionDate {
    SessionDate::from_ymd(year, month, day).unwrap()
}

/// Monday 2024-05-13 08:30 KST
fn monday_morning() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(9 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, 5, 13, 8, 30, 0)
        .unwrap()
}

fn shortcut_config(preset: ReportPreset) -> ScanConfig {
    ScanConfig {
        date_selection: DateSelection::WeekdayShortcut,
        ..ScanConfig::new(preset)
    }
}

/// Friday 2024-05-10 vs Thursday 2024-05-09 across both markets.
fn week_source() -> InMemorySource {
    let friday = date(2024, 5, 10);
    let thursday = date(2024, 5, 9);

    InMemorySource::new()
        .with_volumes(
            friday,
            Market::Kospi,
            &[("005930", 1_000_000), ("000660", 400_000), ("035420", 50)],
        )
        .with_volumes(
            thursday,
            Market::Kospi,
            &[("005930", 100_000), ("000660", 100_000), ("035420", 0)],
        )
        .with_volumes(friday, Market::Kosdaq, &[("247540", 3_000_000)])
        .with_volumes(thursday, Market::Kosdaq, &[("247540", 500_000)])
        .with_caps(
            friday,
            Market::Kospi,
            &[("005930", 400_000_000_000_000), ("000660", 100_000_000_000_000)],
        )
        .with_caps(friday, Market::Kosdaq, &[("247540", 30_000_000_000_000)])
        .with_name("005930", "삼성전자")
        .with_name("247540", "에코프로비엠")
}

#[tokio::test]
async fn test_monday_run_compares_friday_with_thursday() {
    let config = shortcut_config(ReportPreset::Spike);
    let notifier = InMemoryNotifier::new();

    let outcome = run(&config, week_source(), &notifier, monday_morning())
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Delivered(Delivery::Html { chunks: 1 }));

    let expected = "\
<b>[KOSPI/KOSDAQ 거래량 급증 리스트]</b>
기준: 2024-05-10(전일) vs 2024-05-09(전전일)
조건: 전일 거래량 ≥ 전전일의 <b>5배</b>
정렬: 배수 높은 순
전송일: 2024-05-13 Mon 08:30 KST
(주말 미전송, 월요일은 금↔목 비교)

1. 005930 삼성전자 (KOSPI) 10.00x  1,000,000 vs 100,000
2. 247540 에코프로비엠 (KOSDAQ) 6.00x  3,000,000 vs 500,000";

    assert_eq!(
        notifier.delivered(),
        vec![(expected.to_string(), Markup::Html)]
    );
}

#[tokio::test]
async fn test_empty_market_contributes_no_rows() {
    let friday = date(2024, 5, 10);
    let thursday = date(2024, 5, 9);
    let source = InMemorySource::new()
        .with_volumes(friday, Market::Kospi, &[("005930", 1_000_000)])
        .with_volumes(thursday, Market::Kospi, &[("005930", 100_000)])
        .with_volumes(thursday, Market::Kosdaq, &[("247540", 500_000)]);
    let notifier = InMemoryNotifier::new();

    run(
        &shortcut_config(ReportPreset::Spike),
        source,
        &notifier,
        monday_morning(),
    )
    .await
    .unwrap();

    let text = notifier.texts().join("\n");
    assert!(text.contains("1. 005930 (KOSPI) 10.00x"));
    assert!(!text.contains("247540"));
}

#[tokio::test]
async fn test_size_preset_ranks_by_market_cap() {
    let notifier = InMemoryNotifier::new();

    run(
        &shortcut_config(ReportPreset::Size),
        week_source(),
        &notifier,
        monday_morning(),
    )
    .await
    .unwrap();

    let texts = notifier.texts();
    let rows = texts[0].lines().skip(7).collect::<Vec<_>>();
    assert_eq!(
        rows,
        vec![
            "<code>1. 삼성전자         1,000,000</code>",
            "<code>2. 에코프로비엠     3,000,000</code>",
        ]
    );
    assert!(texts[0].starts_with("<b>[KOSPI/KOSDAQ 거래량 급증 (시가총액 순)]</b>"));
}

#[tokio::test]
async fn test_html_rejection_falls_back_to_plain_text() {
    let notifier = InMemoryNotifier::new().failing_on(Markup::Html);

    let outcome = run(
        &shortcut_config(ReportPreset::Spike),
        week_source(),
        &notifier,
        monday_morning(),
    )
    .await
    .unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Delivered(Delivery::PlainFallback { chunks: 1 })
    );

    let delivered = notifier.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].1, Markup::Plain);
    assert!(delivered[0].0.starts_with("[KOSPI/KOSDAQ 거래량 급증 리스트]\n"));
    assert!(!delivered[0].0.contains("<b>"));
}

#[tokio::test]
async fn test_weekend_reference_is_skipped_without_requests() {
    let source = week_source();
    let notifier = InMemoryNotifier::new();
    let saturday = FixedOffset::east_opt(9 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, 5, 18, 8, 30, 0)
        .unwrap();

    let outcome = run(
        &shortcut_config(ReportPreset::Spike),
        &source,
        &notifier,
        saturday,
    )
    .await
    .unwrap();

    assert_eq!(outcome, RunOutcome::Skipped);
    assert!(notifier.delivered().is_empty());
    assert!(source.requests().is_empty());
}

#[tokio::test]
async fn test_probe_falls_back_over_holiday() {
    // Wednesday 2024-05-15 reference, Tuesday 2024-05-14 holiday
    let source = InMemorySource::new()
        .with_volumes(date(2024, 5, 13), Market::Kospi, &[("005930", 700_000)])
        .with_volumes(date(2024, 5, 10), Market::Kospi, &[("005930", 100_000)]);
    let notifier = InMemoryNotifier::new();
    let config = ScanConfig {
        reference_date: Some(date(2024, 5, 15)),
        markets: vec![Market::Kospi],
        ..ScanConfig::new(ReportPreset::Spike)
    };

    run(&config, source, &notifier, monday_morning())
        .await
        .unwrap();

    let text = notifier.texts().join("\n");
    assert!(text.starts_with("<b>[KOSPI 거래량 급증 리스트]</b>"));
    assert!(text.contains("기준: 2024-05-13(전일) vs 2024-05-10(전전일)"));
    assert!(text.contains("1. 005930 (KOSPI) 7.00x  700,000 vs 100,000"));
}

#[tokio::test]
async fn test_insufficient_trading_days_alerts() {
    let notifier = InMemoryNotifier::new();
    let config = ScanConfig::new(ReportPreset::Spike);

    let error = run(&config, InMemorySource::new(), &notifier, monday_morning())
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        ScanError::InsufficientTradingDays {
            found: 0,
            required: 2,
            lookback: 14
        }
    ));

    alert(&notifier, &error).await;
    assert_eq!(
        notifier.delivered(),
        vec![(
            "⚠️ 자동화 에러: found 0 of 2 required trading days within 14 days before the reference date"
                .to_string(),
            Markup::Plain
        )]
    );
}
