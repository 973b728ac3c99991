//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use domain_invoicing::{ErrorKind, InvoiceNumber, ServiceArea};

/// Strategy for generating valid invoice numbers
pub fn invoice_number_strategy() -> impl Strategy<Value = InvoiceNumber> {
    "[0-9]{4,10}".prop_map(|digits| InvoiceNumber::new(digits).unwrap())
}

/// Strategy for generating service areas
pub fn service_area_strategy() -> impl Strategy<Value = ServiceArea> {
    prop_oneof![
        Just(ServiceArea::Soat),
        Just(ServiceArea::Outpatient),
        Just(ServiceArea::Emergency),
        Just(ServiceArea::Hospitalization),
        Just(ServiceArea::Vaccination),
    ]
}

/// Strategy for generating audit error kinds
pub fn error_kind_strategy() -> impl Strategy<Value = ErrorKind> {
    proptest::sample::select(ErrorKind::all().to_vec())
}

/// Strategy for generating dates within the 2020-2029 decade
pub fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..3652).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + Duration::days(offset)
    })
}

/// Strategy for generating (generation, today) pairs with today at or
/// after the generation date
pub fn generation_and_today_strategy() -> impl Strategy<Value = (NaiveDate, NaiveDate)> {
    (0i64..3000, 0i64..400).prop_map(|(start, gap)| {
        let generation = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + Duration::days(start);
        (generation, generation + Duration::days(gap))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_invoice_numbers_are_valid(number in invoice_number_strategy()) {
            prop_assert!(number.as_str().bytes().all(|b| b.is_ascii_digit()));
        }

        #[test]
        fn generated_pairs_are_ordered((generation, today) in generation_and_today_strategy()) {
            prop_assert!(generation <= today);
        }
    }
}
