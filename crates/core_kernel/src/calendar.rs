//! Business-day calendar
//!
//! This module decides which calendar dates count as working days and
//! provides the day-counting primitives built on that decision:
//! - A business day is a Monday-Friday date that is not a configured holiday
//! - Holidays are supplied per calendar year as explicit date sets
//! - Years with no configured holiday list fall back to "no holidays known"

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// A working-day calendar with per-year holiday sets
///
/// The calendar maps each year to its finite, explicit list of holiday
/// dates. Asking about a year with no configured list is not an error:
/// the calendar treats it as holiday-free, and callers can detect the
/// gap through [`BusinessCalendar::is_year_configured`] and warn
/// operators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessCalendar {
    holidays: BTreeMap<i32, BTreeSet<NaiveDate>>,
}

impl BusinessCalendar {
    /// Creates a calendar with no holidays configured
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the holiday set for one calendar year
    ///
    /// Dates whose year does not match `year` are filed under `year`
    /// anyway and would never be consulted; the mismatch is a caller
    /// bug, caught in debug builds.
    pub fn with_year_holidays(
        mut self,
        year: i32,
        dates: impl IntoIterator<Item = NaiveDate>,
    ) -> Self {
        let set = self.holidays.entry(year).or_default();
        for date in dates {
            debug_assert_eq!(date.year(), year, "holiday filed under wrong year");
            set.insert(date);
        }
        self
    }

    /// Returns true if a holiday list has been supplied for the year
    pub fn is_year_configured(&self, year: i32) -> bool {
        self.holidays.contains_key(&year)
    }

    /// Iterates over the years that have a configured holiday list
    pub fn configured_years(&self) -> impl Iterator<Item = i32> + '_ {
        self.holidays.keys().copied()
    }

    /// Returns true if the date is a configured holiday
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays
            .get(&date.year())
            .is_some_and(|set| set.contains(&date))
    }

    /// Returns true if the date is a working day
    ///
    /// A working day is a Monday-Friday date that is not a configured
    /// holiday for its year.
    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        is_weekday(date) && !self.is_holiday(date)
    }

    /// Walks forward from `start` until `n` business days have passed
    ///
    /// Returns the date on which the n-th business day is reached.
    /// `n == 0` is the identity: the start date is returned unchanged
    /// even when it is itself a weekend or holiday. For `n >= 1` the
    /// result is always a business day.
    pub fn add_business_days(&self, start: NaiveDate, n: u32) -> NaiveDate {
        let mut current = start;
        let mut counted = 0;
        while counted < n {
            current = current.succ_opt().expect("date out of chrono range");
            if self.is_business_day(current) {
                counted += 1;
            }
        }
        current
    }

    /// Counts business days in the closed interval `[start, end]`
    ///
    /// Both endpoints are included when `start <= end`. When
    /// `start > end` the result is the negation of the swapped-argument
    /// count, so the distance is signed:
    /// `business_days_between(a, b) == -business_days_between(b, a)`
    /// for all `a != b`.
    pub fn business_days_between(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        if start > end {
            return -self.business_days_between(end, start);
        }
        let mut count = 0;
        let mut current = start;
        while current <= end {
            if self.is_business_day(current) {
                count += 1;
            }
            current = current.succ_opt().expect("date out of chrono range");
        }
        count
    }
}

/// Returns true for Monday through Friday
fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekdays_are_business_days() {
        let cal = BusinessCalendar::new();
        // 2025-06-02 is a Monday
        assert!(cal.is_business_day(date(2025, 6, 2)));
        assert!(cal.is_business_day(date(2025, 6, 6)));
        assert!(!cal.is_business_day(date(2025, 6, 7)));
        assert!(!cal.is_business_day(date(2025, 6, 8)));
    }

    #[test]
    fn test_configured_holiday_is_not_business_day() {
        let cal = BusinessCalendar::new()
            .with_year_holidays(2025, [date(2025, 1, 1), date(2025, 5, 1)]);
        // both fall on weekdays in 2025
        assert!(!cal.is_business_day(date(2025, 1, 1)));
        assert!(!cal.is_business_day(date(2025, 5, 1)));
        assert!(cal.is_business_day(date(2025, 1, 2)));
    }

    #[test]
    fn test_unconfigured_year_defaults_to_no_holidays() {
        let cal = BusinessCalendar::new().with_year_holidays(2025, [date(2025, 1, 1)]);
        assert!(!cal.is_year_configured(2024));
        // same civil date, year without a list: treated as a plain weekday
        assert!(cal.is_business_day(date(2024, 1, 1)));
    }

    #[test]
    fn test_add_zero_business_days_is_identity() {
        let cal = BusinessCalendar::new();
        let saturday = date(2025, 6, 7);
        assert_eq!(cal.add_business_days(saturday, 0), saturday);
    }

    #[test]
    fn test_add_business_days_skips_weekend() {
        let cal = BusinessCalendar::new();
        let friday = date(2025, 6, 6);
        assert_eq!(cal.add_business_days(friday, 1), date(2025, 6, 9));
        assert_eq!(cal.add_business_days(friday, 5), date(2025, 6, 13));
    }

    #[test]
    fn test_add_business_days_skips_holiday() {
        let cal = BusinessCalendar::new().with_year_holidays(2025, [date(2025, 6, 9)]);
        let friday = date(2025, 6, 6);
        // Monday the 9th is a holiday, so one business day lands on Tuesday
        assert_eq!(cal.add_business_days(friday, 1), date(2025, 6, 10));
    }

    #[test]
    fn test_between_inclusive_of_both_ends() {
        let cal = BusinessCalendar::new();
        // Monday through Friday of one week
        assert_eq!(
            cal.business_days_between(date(2025, 6, 2), date(2025, 6, 6)),
            5
        );
        // a single business day interval counts itself
        assert_eq!(
            cal.business_days_between(date(2025, 6, 4), date(2025, 6, 4)),
            1
        );
    }

    #[test]
    fn test_between_is_signed() {
        let cal = BusinessCalendar::new();
        let a = date(2025, 6, 2);
        let b = date(2025, 6, 13);
        assert_eq!(
            cal.business_days_between(a, b),
            -cal.business_days_between(b, a)
        );
    }

    #[test]
    fn test_between_over_weekend_only() {
        let cal = BusinessCalendar::new();
        assert_eq!(
            cal.business_days_between(date(2025, 6, 7), date(2025, 6, 8)),
            0
        );
    }
}
