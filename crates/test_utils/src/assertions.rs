//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for domain types that give
//! more meaningful error messages than standard assertions.

use domain_invoicing::{BatchOutcome, InvoiceProjection, RemainingDisplay};

/// Asserts that a worklist is ordered by its priority buckets
///
/// # Panics
///
/// Panics with the offending pair of rows if any row sorts before a
/// more urgent one.
pub fn assert_worklist_ordered(rows: &[InvoiceProjection]) {
    use domain_invoicing::status::sort_bucket;

    for window in rows.windows(2) {
        let (a, b) = (&window[0], &window[1]);
        let (bucket_a, bucket_b) = (sort_bucket(a), sort_bucket(b));
        assert!(
            bucket_a < bucket_b
                || (bucket_a == bucket_b && a.generation_date >= b.generation_date),
            "Worklist out of order: {} (bucket {}, {}) before {} (bucket {}, {})",
            a.invoice_number,
            bucket_a,
            a.generation_date,
            b.invoice_number,
            bucket_b,
            b.generation_date
        );
    }
}

/// Asserts that a row shows the collapsed reissue marker
pub fn assert_requires_reissue(row: &InvoiceProjection) {
    assert_eq!(
        row.remaining,
        RemainingDisplay::Refacturar,
        "Expected invoice {} to require reissue, got {:?}",
        row.invoice_number,
        row.remaining
    );
}

/// Asserts that a batch outcome lost no rows
pub fn assert_batch_reconciles(outcome: &BatchOutcome) {
    assert_eq!(
        outcome.total_rows,
        outcome.inserted + outcome.skipped,
        "Batch counts do not reconcile: total={}, inserted={}, skipped={}",
        outcome.total_rows,
        outcome.inserted,
        outcome.skipped
    );
}
