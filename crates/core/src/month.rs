// crates/core/src/month.rs
//! Month bucketing for metric aggregation.
//!
//! All time grouping in the monitor works on derived `yyyy-MM` keys, never
//! on stored columns. [`MonthKey`] is the parsed form of such a key and
//! carries the label formatting used by the dashboard's month picker and
//! chart axes.

use std::fmt;

use chrono::Month;
use thiserror::Error;

/// Failure to interpret a `yyyy-MM` string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MonthKeyError {
    #[error("malformed month key `{0}`, expected yyyy-MM")]
    Malformed(String),

    #[error("month {0} out of range 1-12")]
    OutOfRange(u32),
}

/// A `(year, month)` bucket parsed from a `yyyy-MM` key.
///
/// Ordering is chronological, which coincides with lexicographic order of
/// the zero-padded string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    /// Build a key, rejecting months outside `1..=12`.
    pub fn new(year: i32, month: u32) -> Result<Self, MonthKeyError> {
        if !(1..=12).contains(&month) {
            return Err(MonthKeyError::OutOfRange(month));
        }
        Ok(Self { year, month })
    }

    /// Parse a `yyyy-MM` key, e.g. `"2024-01"`.
    pub fn parse(s: &str) -> Result<Self, MonthKeyError> {
        let malformed = || MonthKeyError::Malformed(s.to_string());
        let (year, month) = s.split_once('-').ok_or_else(malformed)?;
        let year: i32 = year.parse().map_err(|_| malformed())?;
        let month: u32 = month.parse().map_err(|_| malformed())?;
        Self::new(year, month)
    }

    /// English month name, e.g. `"January"`.
    pub fn month_name(&self) -> &'static str {
        // month is validated on construction, so the conversion cannot fail
        Month::try_from(self.month as u8)
            .expect("month in 1..=12")
            .name()
    }

    /// Human label for pickers and chart categories, e.g. `"January 2024"`.
    pub fn label(&self) -> String {
        format!("{} {}", self.month_name(), self.year)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_key() {
        let key = MonthKey::parse("2024-01").unwrap();
        assert_eq!(key.year, 2024);
        assert_eq!(key.month, 1);
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert!(matches!(
            MonthKey::parse("2024"),
            Err(MonthKeyError::Malformed(_))
        ));
        assert!(matches!(
            MonthKey::parse("abcd-ef"),
            Err(MonthKeyError::Malformed(_))
        ));
        assert!(matches!(
            MonthKey::parse(""),
            Err(MonthKeyError::Malformed(_))
        ));
    }

    #[test]
    fn parse_rejects_out_of_range_month() {
        assert_eq!(
            MonthKey::parse("2024-13"),
            Err(MonthKeyError::OutOfRange(13))
        );
        assert_eq!(MonthKey::parse("2024-00"), Err(MonthKeyError::OutOfRange(0)));
    }

    #[test]
    fn display_zero_pads() {
        let key = MonthKey::new(2024, 3).unwrap();
        assert_eq!(key.to_string(), "2024-03");
    }

    #[test]
    fn label_and_month_name() {
        let key = MonthKey::parse("2024-02").unwrap();
        assert_eq!(key.month_name(), "February");
        assert_eq!(key.label(), "February 2024");
    }

    #[test]
    fn ordering_is_chronological() {
        let dec = MonthKey::parse("2023-12").unwrap();
        let jan = MonthKey::parse("2024-01").unwrap();
        let feb = MonthKey::parse("2024-02").unwrap();
        assert!(dec < jan);
        assert!(jan < feb);
    }
}
