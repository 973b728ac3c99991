//! Bulk intake validation
//!
//! Normalizes and validates a batch of raw (invoice number, date)
//! string pairs before they enter the lifecycle. Bad rows are skipped
//! and counted, never propagated: the batch must continue past them.
//! Accepted rows go through the same creation entry point as
//! single-entry invoices.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::{Biller, Payer, ServiceArea};
use crate::error::InvoiceError;
use crate::invoice::InvoiceNumber;

/// Date formats accepted on intake
const ENTRY_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// Parses an entry date string in `YYYY-MM-DD` or `DD/MM/YYYY` form
pub fn parse_entry_date(raw: &str) -> Result<NaiveDate, InvoiceError> {
    let raw = raw.trim();
    ENTRY_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .ok_or_else(|| {
            InvoiceError::validation(format!(
                "Date '{}' is not in YYYY-MM-DD or DD/MM/YYYY format",
                raw
            ))
        })
}

/// One raw row from an uploaded tabular file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeRow {
    pub invoice_number: String,
    pub generation_date: String,
}

/// Classification shared by every row of one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeDefaults {
    pub biller: Biller,
    pub payer: Payer,
    pub service_area: ServiceArea,
}

/// Result of one bulk intake run
///
/// All three counters are reported so callers can verify no row was
/// silently lost: `total_rows == inserted + skipped` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub total_rows: usize,
    pub inserted: usize,
    pub skipped: usize,
}

/// Validates one intake row's shape
///
/// Checks the number is all digits, the date parses, and the date is
/// not in the future. Duplicate detection happens at insert time,
/// against the store's uniqueness constraint.
pub fn validate_row(
    row: &IntakeRow,
    today: NaiveDate,
) -> Result<(InvoiceNumber, NaiveDate), InvoiceError> {
    let number = InvoiceNumber::new(row.invoice_number.trim())?;
    let date = parse_entry_date(&row.generation_date)?;
    if date > today {
        return Err(InvoiceError::validation(format!(
            "Generation date {} is in the future",
            date
        )));
    }
    Ok((number, date))
}
