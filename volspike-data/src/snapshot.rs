use crate::{
    instrument::Ticker,
    market::Market,
    schema::{self, FieldSpec, NegotiatedSchema},
    session::SessionDate,
};
use fnv::FnvHashSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::marker::PhantomData;
use tracing::{debug, warn};

/// Single raw row as returned by a [`MarketDataSource`](crate::source::MarketDataSource).
pub type RawRow = serde_json::Map<String, Value>;

/// Unvalidated per-instrument rows for one session & market.
#[derive(Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct RawSnapshot {
    pub rows: Vec<RawRow>,
}

impl RawSnapshot {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Union of the keys present across all rows.
    pub fn columns(&self) -> FnvHashSet<&str> {
        self.rows
            .iter()
            .flat_map(|row| row.keys().map(String::as_str))
            .collect()
    }
}

/// Kind of quantity a [`Snapshot`] holds.
pub trait SnapshotKind {
    /// Schema field the quantity is negotiated from.
    const FIELD: FieldSpec;

    fn as_str() -> &'static str;
}

/// [`SnapshotKind`] for accumulated traded volume (shares).
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct Volume;

impl SnapshotKind for Volume {
    const FIELD: FieldSpec = schema::VOLUME;

    fn as_str() -> &'static str {
        "volume"
    }
}

/// [`SnapshotKind`] for market capitalisation (KRW).
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct MarketCap;

impl SnapshotKind for MarketCap {
    const FIELD: FieldSpec = schema::MARKET_CAP;

    fn as_str() -> &'static str {
        "market_cap"
    }
}

/// Normalised quantity for one instrument.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
pub struct SnapshotEntry {
    pub market: Market,
    pub value: u64,
}

/// Normalised ticker -> quantity mapping for one session, covering one or more markets.
///
/// Entries keep source row order. Only values that parsed as non-negative numbers are
/// present; an absent ticker means "unknown", never "zero".
#[derive(Clone, PartialEq, Debug)]
pub struct Snapshot<Kind> {
    pub session: SessionDate,
    markets: Vec<Market>,
    entries: IndexMap<Ticker, SnapshotEntry>,
    phantom: PhantomData<Kind>,
}

/// Traded volume per ticker.
pub type VolumeSnapshot = Snapshot<Volume>;

/// Market capitalisation per ticker.
pub type CapSnapshot = Snapshot<MarketCap>;

impl<Kind> Snapshot<Kind>
where
    Kind: SnapshotKind,
{
    /// Snapshot covering no market yet.
    pub fn new(session: SessionDate) -> Self {
        Self {
            session,
            markets: Vec::new(),
            entries: IndexMap::new(),
            phantom: PhantomData,
        }
    }

    pub fn empty(session: SessionDate, market: Market) -> Self {
        Self {
            markets: vec![market],
            ..Self::new(session)
        }
    }

    /// Normalise raw rows, dropping rows whose ticker or value cannot be read.
    ///
    /// An empty row set, or one with no recognisable ticker/value column, yields an empty
    /// snapshot.
    pub fn from_raw(session: SessionDate, market: Market, raw: &RawSnapshot) -> Self {
        let mut snapshot = Self::empty(session, market);

        if raw.is_empty() {
            debug!(%session, %market, kind = Kind::as_str(), "snapshot source returned no rows");
            return snapshot;
        }

        let columns = raw.columns();
        let schema = match NegotiatedSchema::negotiate(&columns, &Kind::FIELD) {
            Ok(schema) => schema,
            Err(error) => {
                warn!(%session, %market, kind = Kind::as_str(), %error, "snapshot schema mismatch");
                return snapshot;
            }
        };

        let mut dropped = 0usize;
        for row in &raw.rows {
            let ticker = row.get(schema.ticker).and_then(parse_ticker);
            let value = row.get(schema.value).and_then(parse_quantity);

            match (ticker, value) {
                (Some(ticker), Some(value)) => {
                    snapshot
                        .entries
                        .entry(ticker)
                        .or_insert(SnapshotEntry { market, value });
                }
                _ => dropped += 1,
            }
        }

        debug!(
            %session,
            %market,
            kind = Kind::as_str(),
            column = schema.value,
            kept = snapshot.entries.len(),
            dropped,
            "normalised snapshot"
        );

        snapshot
    }

    /// Merge another snapshot of the same session into this one.
    ///
    /// On a ticker present in both, the entry already held by `self` wins.
    pub fn merge(mut self, other: Self) -> Self {
        if self.session != other.session {
            warn!(
                session = %self.session,
                other = %other.session,
                "merging snapshots of different sessions"
            );
        }

        for market in other.markets {
            if !self.markets.contains(&market) {
                self.markets.push(market);
            }
        }
        for (ticker, entry) in other.entries {
            self.entries.entry(ticker).or_insert(entry);
        }

        self
    }

    pub fn insert(&mut self, ticker: Ticker, entry: SnapshotEntry) {
        self.entries.insert(ticker, entry);
    }

    pub fn get(&self, ticker: &Ticker) -> Option<&SnapshotEntry> {
        self.entries.get(ticker)
    }

    pub fn value(&self, ticker: &Ticker) -> Option<u64> {
        self.entries.get(ticker).map(|entry| entry.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Ticker, &SnapshotEntry)> {
        self.entries.iter()
    }

    pub fn markets(&self) -> &[Market] {
        &self.markets
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse a ticker cell, accepting strings and bare numbers.
fn parse_ticker(value: &Value) -> Option<Ticker> {
    let ticker = match value {
        Value::String(code) => Ticker::new(code),
        Value::Number(code) => Ticker::new(code.to_string()),
        _ => return None,
    };

    (!ticker.as_str().is_empty()).then_some(ticker)
}

/// Parse a numeric cell into a non-negative integer quantity.
///
/// Accepts JSON numbers and strings with thousands separators or whitespace. Fractions are
/// truncated. Placeholders (`-`, empty), negative and non-finite values are rejected.
pub fn parse_quantity(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().and_then(float_to_quantity)),
        Value::String(raw) => {
            let cleaned = raw
                .chars()
                .filter(|c| *c != ',' && *c != '_' && !c.is_whitespace())
                .collect::<String>();

            if cleaned.is_empty() || cleaned == "-" {
                return None;
            }

            cleaned
                .parse::<u64>()
                .ok()
                .or_else(|| cleaned.parse::<f64>().ok().and_then(float_to_quantity))
        }
        _ => None,
    }
}

fn float_to_quantity(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0 && value < u64::MAX as f64).then(|| value.trunc() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> SessionDate {
        SessionDate::from_ymd(2024, 5, 10).unwrap()
    }

    fn raw(rows: Value) -> RawSnapshot {
        serde_json::from_value(json!({ "rows": rows })).unwrap()
    }

    #[test]
    fn test_parse_quantity() {
        struct TestCase {
            input: Value,
            expected: Option<u64>,
        }

        let tests = vec![
            TestCase {
                // TC0: plain integer
                input: json!(1_000_000),
                expected: Some(1_000_000),
            },
            TestCase {
                // TC1: string w/ thousands separators
                input: json!("12,345,678"),
                expected: Some(12_345_678),
            },
            TestCase {
                // TC2: zero is a real value, not a parse failure
                input: json!("0"),
                expected: Some(0),
            },
            TestCase {
                // TC3: fractional string is truncated
                input: json!("1,234.9"),
                expected: Some(1_234),
            },
            TestCase {
                // TC4: KRX placeholder
                input: json!("-"),
                expected: None,
            },
            TestCase {
                // TC5: empty string
                input: json!(" "),
                expected: None,
            },
            TestCase {
                // TC6: negative number
                input: json!(-5),
                expected: None,
            },
            TestCase {
                // TC7: garbage
                input: json!("n/a"),
                expected: None,
            },
            TestCase {
                // TC8: non-finite
                input: json!("NaN"),
                expected: None,
            },
            TestCase {
                // TC9: null
                input: Value::Null,
                expected: None,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = parse_quantity(&test.input);
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_from_raw_drops_unparsable_rows() {
        let raw = raw(json!([
            { "ISU_SRT_CD": "005930", "ISU_ABBRV": "삼성전자", "ACC_TRDVOL": "12,000,000" },
            { "ISU_SRT_CD": "000660", "ISU_ABBRV": "SK하이닉스", "ACC_TRDVOL": "-" },
            { "ISU_SRT_CD": "035420", "ISU_ABBRV": "NAVER", "ACC_TRDVOL": "0" },
            { "ISU_ABBRV": "no ticker", "ACC_TRDVOL": "10" },
        ]));

        let snapshot = VolumeSnapshot::from_raw(session(), Market::Kospi, &raw);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.value(&Ticker::new("005930")), Some(12_000_000));
        assert_eq!(snapshot.value(&Ticker::new("000660")), None);
        assert_eq!(snapshot.value(&Ticker::new("035420")), Some(0));
        assert_eq!(snapshot.markets(), &[Market::Kospi]);
    }

    #[test]
    fn test_from_raw_uses_fallback_column() {
        let raw = raw(json!([
            { "티커": "005930", "거래량": 15_000 },
            { "티커": "000660", "거래량": 2_500 },
        ]));

        let snapshot = VolumeSnapshot::from_raw(session(), Market::Kospi, &raw);

        assert_eq!(snapshot.value(&Ticker::new("000660")), Some(2_500));
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_from_raw_missing_value_column_is_empty() {
        let raw = raw(json!([
            { "ISU_SRT_CD": "005930", "TDD_CLSPRC": "71,000" },
        ]));

        let volumes = VolumeSnapshot::from_raw(session(), Market::Kospi, &raw);
        let caps = CapSnapshot::from_raw(session(), Market::Kospi, &raw);

        assert!(volumes.is_empty());
        assert!(caps.is_empty());
    }

    #[test]
    fn test_merge_keeps_first_entry_and_markets() {
        let kospi = VolumeSnapshot::from_raw(
            session(),
            Market::Kospi,
            &raw(json!([{ "ISU_SRT_CD": "111111", "ACC_TRDVOL": "10" }])),
        );
        let kosdaq = VolumeSnapshot::from_raw(
            session(),
            Market::Kosdaq,
            &raw(json!([
                { "ISU_SRT_CD": "111111", "ACC_TRDVOL": "99" },
                { "ISU_SRT_CD": "222222", "ACC_TRDVOL": "20" },
            ])),
        );

        let merged = kospi.merge(kosdaq);

        assert_eq!(merged.markets(), &[Market::Kospi, Market::Kosdaq]);
        assert_eq!(
            merged.get(&Ticker::new("111111")),
            Some(&SnapshotEntry {
                market: Market::Kospi,
                value: 10
            })
        );
        assert_eq!(merged.value(&Ticker::new("222222")), Some(20));
        let order = merged.iter().map(|(ticker, _)| ticker.as_str()).collect::<Vec<_>>();
        assert_eq!(order, vec!["111111", "222222"]);
    }
}
