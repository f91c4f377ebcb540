use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire format of the `start`/`end` query parameters.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum DateRangeError {
    #[error("Invalid date {value:?}, expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("Start date {start} is after end date {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },

    #[error("Going back {days} days from {from} leaves the supported date range")]
    OutOfRange { from: NaiveDate, days: u64 },
}

fn days_before(from: NaiveDate, days: u64) -> Result<NaiveDate, DateRangeError> {
    from.checked_sub_days(Days::new(days))
        .ok_or(DateRangeError::OutOfRange { from, days })
}

/// Inclusive calendar-day range requested from the events API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if start > end {
            return Err(DateRangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// The range ending yesterday (relative to `today`) and spanning `lookback_days` before it.
    pub fn ending_yesterday(today: NaiveDate, lookback_days: u32) -> Result<Self, DateRangeError> {
        Self::resolve(None, None, today, lookback_days)
    }

    /// Resolves optional CLI flags against the default range.
    ///
    /// A missing `end` defaults to yesterday; a missing `start` defaults to
    /// `lookback_days` before the resolved end.
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
        lookback_days: u32,
    ) -> Result<Self, DateRangeError> {
        let end = match end {
            Some(end) => end,
            None => days_before(today, 1)?,
        };
        let start = match start {
            Some(start) => start,
            None => days_before(end, u64::from(lookback_days))?,
        };
        Self::new(start, end)
    }

    pub fn start_param(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start_param(), self.end_param())
    }
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate, DateRangeError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| DateRangeError::InvalidDate {
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn default_range_ends_yesterday() {
        let r = DateRange::ending_yesterday(d("2025-11-13"), 1).unwrap();
        assert_eq!(r.start_param(), "2025-11-11");
        assert_eq!(r.end_param(), "2025-11-12");
    }

    #[test]
    fn resolve_fills_missing_bounds() {
        let r = DateRange::resolve(Some(d("2025-01-01")), None, d("2025-03-10"), 30).unwrap();
        assert_eq!(r.start, d("2025-01-01"));
        assert_eq!(r.end, d("2025-03-09"));

        let r = DateRange::resolve(None, Some(d("2025-03-01")), d("2025-03-10"), 3).unwrap();
        assert_eq!(r.start, d("2025-02-26"));
    }

    #[test]
    fn oversized_lookback_is_an_error() {
        let err = DateRange::resolve(None, None, d("2026-10-18"), u32::MAX).unwrap_err();
        assert!(matches!(err, DateRangeError::OutOfRange { days, .. } if days == u64::from(u32::MAX)));

        let err = DateRange::resolve(None, Some(NaiveDate::MIN), d("2026-10-18"), 1).unwrap_err();
        assert!(matches!(err, DateRangeError::OutOfRange { .. }));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = DateRange::new(d("2025-02-01"), d("2025-01-01")).unwrap_err();
        assert!(matches!(err, DateRangeError::Inverted { .. }));
        assert!(parse_date("01/02/2025").is_err());
    }
}
