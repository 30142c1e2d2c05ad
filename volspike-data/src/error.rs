use crate::{instrument::Ticker, market::Market, session::SessionDate};
use thiserror::Error;

/// All errors generated in `volspike-data`.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Error)]
pub enum DataError {
    #[error("market data request failed: {0}")]
    Request(String),

    #[error("market data source responded with HTTP status {status}: {context}")]
    Status { status: u16, context: String },

    #[error("failed to decode market data response: {0}")]
    Decode(String),

    #[error("no snapshot rows for {market} on {session}")]
    SnapshotUnavailable { session: SessionDate, market: Market },

    #[error("instrument name unavailable for ticker: {0}")]
    NameUnavailable(Ticker),

    #[error("invalid market data source url: {0}")]
    InvalidUrl(String),
}

impl DataError {
    /// Determine if an error means the market data source cannot be used for this run.
    ///
    /// Soft errors describe a single empty slice or a single missing name and are
    /// represented downstream as empty data.
    #[allow(clippy::match_like_matches_macro)]
    pub fn is_fatal(&self) -> bool {
        match self {
            DataError::SnapshotUnavailable { .. } | DataError::NameUnavailable(_) => false,
            _ => true,
        }
    }
}

impl From<reqwest::Error> for DataError {
    fn from(value: reqwest::Error) -> Self {
        match value.status() {
            Some(status) => Self::Status {
                status: status.as_u16(),
                context: value.to_string(),
            },
            None if value.is_decode() => Self::Decode(value.to_string()),
            None => Self::Request(value.to_string()),
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

impl From<url::ParseError> for DataError {
    fn from(value: url::ParseError) -> Self {
        Self::InvalidUrl(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_data_error_is_fatal() {
        struct TestCase {
            input: DataError,
            expected: bool,
        }

        let session = SessionDate::from(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap());

        let tests = vec![
            TestCase {
                // TC0: is fatal w/ DataError::Request
                input: DataError::Request("connection refused".to_string()),
                expected: true,
            },
            TestCase {
                // TC1: is fatal w/ DataError::Status
                input: DataError::Status {
                    status: 503,
                    context: "service unavailable".to_string(),
                },
                expected: true,
            },
            TestCase {
                // TC2: is fatal w/ DataError::Decode
                input: DataError::from(
                    serde_json::from_str::<serde_json::Value>("<html>").unwrap_err(),
                ),
                expected: true,
            },
            TestCase {
                // TC3: is not fatal w/ DataError::SnapshotUnavailable
                input: DataError::SnapshotUnavailable {
                    session,
                    market: Market::Kosdaq,
                },
                expected: false,
            },
            TestCase {
                // TC4: is not fatal w/ DataError::NameUnavailable
                input: DataError::NameUnavailable(Ticker::new("005930")),
                expected: false,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = test.input.is_fatal();
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_data_error_display() {
        let session = SessionDate::from(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap());
        let error = DataError::SnapshotUnavailable {
            session,
            market: Market::Kospi,
        };
        assert_eq!(error.to_string(), "no snapshot rows for KOSPI on 2024-05-10");
    }
}
