//! Unit tests for the deadline engine
//!
//! Tests cover due-date placement, the sign convention of the
//! remaining-days figure, and determinism under repeated evaluation.

use chrono::{Duration, NaiveDate};
use core_kernel::{BusinessCalendar, DeadlineEngine, FILING_WINDOW_BUSINESS_DAYS};
use proptest::prelude::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn engine() -> DeadlineEngine {
    DeadlineEngine::new(
        BusinessCalendar::new().with_year_holidays(2025, [date(2025, 5, 1), date(2025, 8, 7)]),
    )
}

#[test]
fn test_due_date_honors_holidays() {
    let engine = engine();
    // Monday 2025-04-28; May 1 (Thursday) is a holiday inside the window
    let due = engine.due_date(date(2025, 4, 28));
    let plain = DeadlineEngine::new(BusinessCalendar::new()).due_date(date(2025, 4, 28));
    assert_eq!(due, plain.succ_opt().unwrap());
}

#[test]
fn test_window_constant_drives_due_date() {
    let engine = DeadlineEngine::new(BusinessCalendar::new());
    let reference = date(2025, 6, 2);
    assert_eq!(
        engine.due_date(reference),
        engine
            .calendar()
            .add_business_days(reference, FILING_WINDOW_BUSINESS_DAYS)
    );
}

#[test]
fn test_sign_convention() {
    let engine = engine();
    let reference = date(2025, 6, 2);
    let due = engine.due_date(reference);

    assert_eq!(engine.remaining_days(reference, due), 0);
    assert!(engine.remaining_days(reference, reference) > 0);

    let late = engine.calendar().add_business_days(due, 5);
    assert_eq!(engine.remaining_days(reference, late), -5);
}

#[test]
fn test_weekend_after_due_date_counts_no_overdue_days() {
    let engine = DeadlineEngine::new(BusinessCalendar::new()).with_window(1);
    // reference Thursday 2025-06-05 -> due Friday 2025-06-06
    let reference = date(2025, 6, 5);
    assert_eq!(engine.due_date(reference), date(2025, 6, 6));
    // Saturday: no business day has elapsed past the due date yet
    assert_eq!(engine.remaining_days(reference, date(2025, 6, 7)), 0);
    // Monday: one business day overdue
    assert_eq!(engine.remaining_days(reference, date(2025, 6, 9)), -1);
}

proptest! {
    #[test]
    fn remaining_is_deterministic(
        ref_offset in 0i64..3650,
        today_offset in 0i64..3650
    ) {
        let engine = engine();
        let reference = date(2020, 1, 1) + Duration::days(ref_offset);
        let today = date(2020, 1, 1) + Duration::days(today_offset);
        prop_assert_eq!(
            engine.remaining_days(reference, today),
            engine.remaining_days(reference, today)
        );
    }

    #[test]
    fn remaining_never_increases_as_today_advances(
        ref_offset in 0i64..1825,
        today_offset in 0i64..1825,
        step in 1i64..30
    ) {
        let engine = engine();
        let reference = date(2020, 1, 1) + Duration::days(ref_offset);
        let today = date(2020, 1, 1) + Duration::days(today_offset);
        let later = today + Duration::days(step);
        prop_assert!(
            engine.remaining_days(reference, later) <= engine.remaining_days(reference, today)
        );
    }
}
