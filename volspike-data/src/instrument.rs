use crate::market::Market;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Market-unique KRX short code (eg/ "005930").
#[derive(
    Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Deserialize, Serialize,
)]
pub struct Ticker(SmolStr);

impl Ticker {
    pub fn new<S: AsRef<str>>(code: S) -> Self {
        Self(SmolStr::new(code.as_ref().trim()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for Ticker {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Listed instrument as seen by a single scan.
#[derive(Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
pub struct Instrument {
    pub ticker: Ticker,
    /// Display name, empty until resolved (or if resolution failed).
    pub name: String,
    pub market: Market,
    /// Market capitalisation in KRW, when a cap snapshot was fetched.
    pub market_cap: Option<u64>,
}

impl Instrument {
    pub fn new(ticker: Ticker, market: Market) -> Self {
        Self {
            ticker,
            name: String::new(),
            market,
            market_cap: None,
        }
    }
}
