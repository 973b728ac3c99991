//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for common entities across the
//! invoice traceability system. These fixtures are designed to be
//! consistent and predictable for unit tests.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use core_kernel::{BusinessCalendar, DeadlineEngine};
use domain_invoicing::{Biller, Catalog, Payer};

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Standard "today" for deterministic tests (Tuesday 2025-06-10)
    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    /// A recent generation date, well inside the filing window
    pub fn recent_generation_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    /// A generation date far past the filing window
    pub fn overdue_generation_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()
    }

    /// Standard entry timestamp matching [`TemporalFixtures::today`]
    pub fn entry_timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 10, 0, 0).unwrap()
    }

    /// Entry timestamp on an arbitrary day
    pub fn entry_timestamp_on(day: NaiveDate) -> DateTime<Utc> {
        Utc.from_utc_datetime(&day.and_hms_opt(10, 0, 0).unwrap())
    }
}

/// Fixture for calendar test data
pub struct CalendarFixtures;

impl CalendarFixtures {
    /// A weekend-only calendar (no holidays configured)
    pub fn plain() -> BusinessCalendar {
        BusinessCalendar::new()
    }

    /// A calendar with a civil-holiday spread for 2025
    pub fn with_holidays() -> BusinessCalendar {
        BusinessCalendar::new().with_year_holidays(
            2025,
            [
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 8, 7).unwrap(),
                NaiveDate::from_ymd_opt(2025, 12, 25).unwrap(),
            ],
        )
    }

    /// A deadline engine over the plain calendar
    pub fn engine() -> DeadlineEngine {
        DeadlineEngine::new(Self::plain())
    }
}

/// Fixture for catalog test data
pub struct CatalogFixtures;

impl CatalogFixtures {
    /// A biller from the seeded roster
    pub fn biller() -> Biller {
        Catalog::seeded().biller("OSCAR MAYA").unwrap()
    }

    /// A payer from the seeded roster
    pub fn payer() -> Payer {
        Catalog::seeded().payer("SURA").unwrap()
    }

    /// An alternate payer for composite-key tests
    pub fn other_payer() -> Payer {
        Catalog::seeded().payer("NUEVA EPS").unwrap()
    }
}
