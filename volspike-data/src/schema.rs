//! Schema negotiation for raw snapshot rows.
//!
//! Each logical field the scanner needs is described by a [`FieldSpec`]: the canonical key
//! documented by the data source plus a prioritised list of fallback keys. Negotiation picks
//! the first key that is actually present in a row set, so a renamed column degrades to a
//! known alternative instead of silently producing garbage.

use fnv::FnvHashSet;
use thiserror::Error;

/// Logical field with its canonical source key and prioritised fallbacks.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct FieldSpec {
    pub field: &'static str,
    pub canonical: &'static str,
    pub fallbacks: &'static [&'static str],
}

/// Instrument short code.
pub const TICKER: FieldSpec = FieldSpec {
    field: "ticker",
    canonical: "ISU_SRT_CD",
    fallbacks: &["SHORT_CODE", "티커", "ticker"],
};

/// Accumulated traded volume for the session.
pub const VOLUME: FieldSpec = FieldSpec {
    field: "volume",
    canonical: "ACC_TRDVOL",
    fallbacks: &["TRDVOL", "거래량", "volume"],
};

/// Market capitalisation at session close.
pub const MARKET_CAP: FieldSpec = FieldSpec {
    field: "market_cap",
    canonical: "MKTCAP",
    fallbacks: &["MKT_CAP", "시가총액", "market_cap"],
};

/// Abbreviated instrument display name.
pub const NAME: FieldSpec = FieldSpec {
    field: "name",
    canonical: "ISU_ABBRV",
    fallbacks: &["ISU_NM", "종목명", "name"],
};

impl FieldSpec {
    /// Candidate keys in priority order, canonical first.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.canonical).chain(self.fallbacks.iter().copied())
    }

    /// Select the highest priority key present in `columns`.
    pub fn negotiate(&self, columns: &FnvHashSet<&str>) -> Result<&'static str, SchemaError> {
        self.keys()
            .find(|key| columns.contains(key))
            .ok_or_else(|| SchemaError::MissingField {
                field: self.field,
                tried: self.keys().collect(),
            })
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum SchemaError {
    #[error("no column for field '{field}' (tried: {})", tried.join(", "))]
    MissingField {
        field: &'static str,
        tried: Vec<&'static str>,
    },
}

/// Keys chosen for one row set.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct NegotiatedSchema {
    pub ticker: &'static str,
    pub value: &'static str,
    pub name: Option<&'static str>,
}

impl NegotiatedSchema {
    /// Negotiate the ticker key, the key for `value` and (optionally) the name key.
    pub fn negotiate(columns: &FnvHashSet<&str>, value: &FieldSpec) -> Result<Self, SchemaError> {
        Ok(Self {
            ticker: TICKER.negotiate(columns)?,
            value: value.negotiate(columns)?,
            name: NAME.negotiate(columns).ok(),
        })
    }
}
