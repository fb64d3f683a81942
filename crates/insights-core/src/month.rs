//! Calendar month keys used to group sales records.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

// ── MonthKey ──────────────────────────────────────────────────────────────────

/// A calendar month, identified by its first day.
///
/// Derived from a record date by dropping the day of month; two dates map to
/// the same key iff they share year and month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// Build a key from a year and a 1-based month. Returns `None` when the
    /// month is outside `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Truncate `date` to the month containing it.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Calendar month number, `1..=12`.
    pub fn month_number(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-01", self.year, self.month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_every_day_of_a_month_maps_to_the_same_key() {
        let expected = MonthKey::new(2024, 3).unwrap();
        for day in 1..=31 {
            assert_eq!(MonthKey::of(date(2024, 3, day)), expected);
        }
    }

    #[test]
    fn test_month_number_and_display() {
        let key = MonthKey::of(date(2024, 2, 29));
        assert_eq!(key.month_number(), 2);
        assert_eq!(key.to_string(), "2024-02-01");
    }

    #[test]
    fn test_new_rejects_invalid_month() {
        assert!(MonthKey::new(2024, 0).is_none());
        assert!(MonthKey::new(2024, 13).is_none());
    }

    #[test]
    fn test_ordering_is_chronological() {
        let dec = MonthKey::new(2023, 12).unwrap();
        let jan = MonthKey::new(2024, 1).unwrap();
        let feb = MonthKey::new(2024, 2).unwrap();
        assert!(dec < jan);
        assert!(jan < feb);
    }

    #[test]
    fn test_display_is_first_of_month() {
        assert_eq!(MonthKey::of(date(2024, 1, 20)).to_string(), "2024-01-01");
        assert_eq!(MonthKey::of(date(987, 11, 3)).to_string(), "0987-11-01");
    }
}
