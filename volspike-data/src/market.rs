use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Equity markets listed on the Korea Exchange (KRX) that can be scanned.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Market {
    Kospi,
    Kosdaq,
}

impl Market {
    /// Every supported [`Market`], in scan order.
    pub const ALL: [Market; 2] = [Market::Kospi, Market::Kosdaq];

    /// Display tag used in reports and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Kospi => "KOSPI",
            Market::Kosdaq => "KOSDAQ",
        }
    }

    /// KRX data portal market identifier (`mktId` request field).
    pub fn krx_id(&self) -> &'static str {
        match self {
            Market::Kospi => "STK",
            Market::Kosdaq => "KSQ",
        }
    }
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("unknown market: {0} (expected KOSPI or KOSDAQ)")]
pub struct UnknownMarket(pub String);

impl FromStr for Market {
    type Err = UnknownMarket;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_uppercase().as_str() {
            "KOSPI" | "STK" => Ok(Market::Kospi),
            "KOSDAQ" | "KSQ" => Ok(Market::Kosdaq),
            _ => Err(UnknownMarket(input.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_from_str() {
        struct TestCase {
            input: &'static str,
            expected: Result<Market, UnknownMarket>,
        }

        let tests = vec![
            TestCase {
                // TC0: canonical upper case
                input: "KOSPI",
                expected: Ok(Market::Kospi),
            },
            TestCase {
                // TC1: lower case w/ surrounding whitespace
                input: " kosdaq ",
                expected: Ok(Market::Kosdaq),
            },
            TestCase {
                // TC2: KRX market identifier
                input: "STK",
                expected: Ok(Market::Kospi),
            },
            TestCase {
                // TC3: unsupported market
                input: "KONEX",
                expected: Err(UnknownMarket("KONEX".to_string())),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = test.input.parse::<Market>();
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_market_serde_uses_display_tag() {
        let json = serde_json::to_string(&Market::Kosdaq).unwrap();
        assert_eq!(json, "\"KOSDAQ\"");
        assert_eq!(serde_json::from_str::<Market>("\"KOSPI\"").unwrap(), Market::Kospi);
    }
}
