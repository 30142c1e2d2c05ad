use chrono::{Datelike, Days, NaiveDate, Weekday};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Calendar date of a (candidate) trading session.
///
/// Displays as `YYYY-MM-DD`, the data source expects [`SessionDate::yyyymmdd`].
#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Debug,
    Display,
    From,
    Deserialize,
    Serialize,
)]
pub struct SessionDate(NaiveDate);

impl SessionDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Compact `YYYYMMDD` form used by the KRX data portal.
    pub fn yyyymmdd(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }

    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    pub fn is_weekend(&self) -> bool {
        matches!(self.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// The date `days` calendar days earlier, `None` if that underflows the calendar.
    pub fn days_before(&self, days: u64) -> Option<Self> {
        self.0.checked_sub_days(Days::new(days)).map(Self)
    }
}

impl FromStr for SessionDate {
    type Err = chrono::ParseError;

    /// Accepts both `YYYY-MM-DD` and `YYYYMMDD`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(input, "%Y%m%d"))
            .map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_date_formats() {
        let session = SessionDate::from_ymd(2024, 1, 5).unwrap();
        assert_eq!(session.yyyymmdd(), "20240105");
        assert_eq!(session.to_string(), "2024-01-05");
        assert_eq!(session.weekday(), Weekday::Fri);
        assert!(!session.is_weekend());
    }

    #[test]
    fn test_session_date_from_str() {
        let expected = SessionDate::from_ymd(2024, 3, 18).unwrap();
        assert_eq!("2024-03-18".parse::<SessionDate>().unwrap(), expected);
        assert_eq!("20240318".parse::<SessionDate>().unwrap(), expected);
        assert!("18/03/2024".parse::<SessionDate>().is_err());
    }

    #[test]
    fn test_session_date_days_before_crosses_month() {
        let session = SessionDate::from_ymd(2024, 3, 1).unwrap();
        assert_eq!(
            session.days_before(1),
            SessionDate::from_ymd(2024, 2, 29)
        );
    }
}
