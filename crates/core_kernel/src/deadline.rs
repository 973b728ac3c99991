//! Statutory filing deadline computation
//!
//! Given an invoice's reference date and "today", the engine computes
//! the due date (reference + N business days) and the signed number of
//! business days remaining until it. Both computations are pure: no
//! clock access, no side effects, same inputs always give the same
//! answer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::BusinessCalendar;

/// Business days allowed between invoice generation and filing
pub const FILING_WINDOW_BUSINESS_DAYS: u32 = 21;

/// Deadline engine bound to one business calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineEngine {
    calendar: BusinessCalendar,
    window: u32,
}

impl DeadlineEngine {
    /// Creates an engine with the statutory 21-business-day window
    pub fn new(calendar: BusinessCalendar) -> Self {
        Self {
            calendar,
            window: FILING_WINDOW_BUSINESS_DAYS,
        }
    }

    /// Overrides the filing window (used by tests and configuration)
    pub fn with_window(mut self, window: u32) -> Self {
        self.window = window;
        self
    }

    /// Returns the underlying calendar
    pub fn calendar(&self) -> &BusinessCalendar {
        &self.calendar
    }

    /// Computes the statutory due date for a reference date
    pub fn due_date(&self, reference: NaiveDate) -> NaiveDate {
        self.calendar.add_business_days(reference, self.window)
    }

    /// Computes the signed business-day distance from `today` to the due date
    ///
    /// The result counts business days strictly after `today` up to and
    /// including the due date, negated when the due date has passed:
    /// positive = days left, zero = due today, negative = overdue by
    /// that many business days.
    pub fn remaining_days(&self, reference: NaiveDate, today: NaiveDate) -> i64 {
        let due = self.due_date(reference);
        if today <= due {
            self.calendar.business_days_between(today, due)
                - i64::from(self.calendar.is_business_day(today))
        } else {
            -(self.calendar.business_days_between(due, today)
                - i64::from(self.calendar.is_business_day(due)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn engine() -> DeadlineEngine {
        DeadlineEngine::new(BusinessCalendar::new())
    }

    #[test]
    fn test_due_date_is_21_business_days_out() {
        let reference = date(2025, 6, 2); // Monday
        let due = engine().due_date(reference);
        assert_eq!(due, date(2025, 7, 1));
        assert!(engine().calendar().is_business_day(due));
    }

    #[test]
    fn test_remaining_zero_on_due_date() {
        let reference = date(2025, 6, 2);
        let due = engine().due_date(reference);
        assert_eq!(engine().remaining_days(reference, due), 0);
    }

    #[test]
    fn test_remaining_positive_before_due_date() {
        let reference = date(2025, 6, 2);
        // ten business days in: eleven still to go
        let today = engine().calendar().add_business_days(reference, 10);
        assert_eq!(engine().remaining_days(reference, today), 11);
    }

    #[test]
    fn test_remaining_negative_after_due_date() {
        let reference = date(2025, 6, 2);
        let due = engine().due_date(reference);
        let today = engine().calendar().add_business_days(due, 3);
        assert_eq!(engine().remaining_days(reference, today), -3);
    }

    #[test]
    fn test_remaining_is_deterministic() {
        let reference = date(2025, 6, 2);
        let today = date(2025, 6, 20);
        let first = engine().remaining_days(reference, today);
        let second = engine().remaining_days(reference, today);
        assert_eq!(first, second);
    }

    #[test]
    fn test_shorter_window_override() {
        let engine = DeadlineEngine::new(BusinessCalendar::new()).with_window(5);
        let reference = date(2025, 6, 2); // Monday
        assert_eq!(engine.due_date(reference), date(2025, 6, 9));
    }
}
