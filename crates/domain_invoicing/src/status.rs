//! Status derivation and worklist projection
//!
//! Folds lifecycle state, audit sub-state, and the deadline distance
//! into one display status and remaining-days value per invoice, with
//! the total ordering used by the worklist. Everything here is a pure
//! function of the row and "today"; rendering happens elsewhere.

use chrono::{DateTime, NaiveDate, Utc};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{DeadlineEngine, InvoiceId};

use crate::catalog::{Biller, ErrorKind, Payer, ServiceArea};
use crate::invoice::{AuditStatus, Invoice, InvoiceNumber, LifecycleStatus};

/// The remaining-days cell of a worklist row
///
/// Overdue invoices that are still the biller's problem collapse to
/// `Refacturar`; invoices due today collapse to `DueToday`; everything
/// else shows the signed business-day count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemainingDisplay {
    Days(i64),
    DueToday,
    Refacturar,
}

impl RemainingDisplay {
    /// Returns true for the two collapsed, overdue-or-due markers
    pub fn is_urgent_marker(&self) -> bool {
        matches!(self, RemainingDisplay::DueToday | RemainingDisplay::Refacturar)
    }
}

impl fmt::Display for RemainingDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemainingDisplay::Days(days) => write!(f, "{}", days),
            RemainingDisplay::DueToday => f.write_str("HoyVence"),
            RemainingDisplay::Refacturar => f.write_str("Refacturar"),
        }
    }
}

impl Serialize for RemainingDisplay {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            RemainingDisplay::Days(days) => serializer.serialize_i64(*days),
            RemainingDisplay::DueToday => serializer.serialize_str("HoyVence"),
            RemainingDisplay::Refacturar => serializer.serialize_str("Refacturar"),
        }
    }
}

/// The status cell of a worklist row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    /// Past or at the deadline and still the biller's problem
    Overdue,
    /// Either side of a replacement pair
    Replaced,
    /// Plain active invoice
    Active,
}

impl DisplayStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DisplayStatus::Overdue => "Vencidas",
            DisplayStatus::Replaced => "Reemplazada",
            DisplayStatus::Active => "Activa",
        }
    }
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Row-highlight hint for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowHighlight {
    /// Returned by the auditor
    Returned,
    /// Corrected, awaiting re-review
    Corrected,
    /// Must be reissued
    Reissue,
    /// Three or fewer business days left, or due today
    Warning,
    /// More than three business days left
    Healthy,
    /// No emphasis
    None,
}

/// Joined context from the other side of a replacement pair
///
/// Storage supplies the linked original's number and generation date
/// when the row carries a back-reference; both are `None` otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainContext {
    pub original_number: Option<InvoiceNumber>,
    pub original_generation_date: Option<NaiveDate>,
}

/// Display-ready projection of one invoice row
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceProjection {
    pub id: InvoiceId,
    pub service_area: ServiceArea,
    pub biller: Biller,
    pub payer: Payer,
    /// Invoice number column; for a replacement row this is the
    /// original's number so provenance reads naturally
    pub invoice_number: InvoiceNumber,
    /// Replacement number column; blank for rows outside any pair
    pub replacement_number: Option<InvoiceNumber>,
    pub generation_date: NaiveDate,
    pub replacement_date: Option<NaiveDate>,
    pub delivered_at: DateTime<Utc>,
    pub remaining: RemainingDisplay,
    pub status: DisplayStatus,
    pub audit_status: AuditStatus,
    pub error_kind: Option<ErrorKind>,
    pub audit_observation: Option<String>,
    pub filing_delivered_at: Option<DateTime<Utc>>,
    pub highlight: RowHighlight,
}

/// Derives display projections from invoice rows
#[derive(Debug, Clone)]
pub struct StatusResolver {
    engine: DeadlineEngine,
}

impl StatusResolver {
    pub fn new(engine: DeadlineEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &DeadlineEngine {
        &self.engine
    }

    /// Resolves one invoice into its worklist row
    pub fn resolve(
        &self,
        invoice: &Invoice,
        chain: &ChainContext,
        today: NaiveDate,
    ) -> InvoiceProjection {
        let raw_remaining = self
            .engine
            .remaining_days(invoice.deadline_reference_date(), today);
        let remaining = derive_remaining(invoice, raw_remaining);
        let status = derive_status(invoice, remaining);
        let highlight = derive_highlight(invoice.audit_status, remaining);

        let (invoice_number, replacement_number, generation_date, replacement_date) =
            resolve_chain_columns(invoice, chain);

        InvoiceProjection {
            id: invoice.id,
            service_area: invoice.service_area,
            biller: invoice.biller.clone(),
            payer: invoice.payer.clone(),
            invoice_number,
            replacement_number,
            generation_date,
            replacement_date,
            delivered_at: invoice.delivered_at,
            remaining,
            status,
            audit_status: invoice.audit_status,
            error_kind: invoice.error_kind,
            audit_observation: invoice.audit_observation.clone(),
            filing_delivered_at: invoice.filing_delivered_at,
            highlight,
        }
    }

    /// Returns true if the invoice currently requires a reissue
    ///
    /// This is the precondition the reissue action checks.
    pub fn requires_reissue(&self, invoice: &Invoice, today: NaiveDate) -> bool {
        let raw = self
            .engine
            .remaining_days(invoice.deadline_reference_date(), today);
        derive_remaining(invoice, raw) == RemainingDisplay::Refacturar
    }
}

/// Collapses the raw remaining-days figure per the exemption rules
fn derive_remaining(invoice: &Invoice, raw: i64) -> RemainingDisplay {
    let exempt =
        invoice.audit_status.suspends_reissue() || invoice.lifecycle == LifecycleStatus::Replaced;
    if exempt {
        return RemainingDisplay::Days(raw);
    }
    match raw {
        days if days < 0 => RemainingDisplay::Refacturar,
        0 => RemainingDisplay::DueToday,
        days => RemainingDisplay::Days(days),
    }
}

/// Folds remaining and replacement linkage into the status column
fn derive_status(invoice: &Invoice, remaining: RemainingDisplay) -> DisplayStatus {
    if remaining.is_urgent_marker() {
        DisplayStatus::Overdue
    } else if invoice.lifecycle == LifecycleStatus::Replaced || invoice.is_replacement() {
        DisplayStatus::Replaced
    } else {
        DisplayStatus::Active
    }
}

/// Maps the row to its highlight color bucket
fn derive_highlight(audit_status: AuditStatus, remaining: RemainingDisplay) -> RowHighlight {
    match audit_status {
        AuditStatus::ReturnedByAuditor => return RowHighlight::Returned,
        AuditStatus::CorrectedByBiller => return RowHighlight::Corrected,
        _ => {}
    }
    match remaining {
        RemainingDisplay::Refacturar => RowHighlight::Reissue,
        RemainingDisplay::DueToday => RowHighlight::Warning,
        RemainingDisplay::Days(days) if (1..=3).contains(&days) => RowHighlight::Warning,
        RemainingDisplay::Days(days) if days > 3 => RowHighlight::Healthy,
        RemainingDisplay::Days(_) => RowHighlight::None,
    }
}

/// Resolves the number and date columns across a replacement pair
///
/// A replacement row shows the original's number and generation date
/// with its own number in the replacement column; a superseded row
/// shows its own data plus the successor's number; plain rows leave
/// the replacement columns blank.
fn resolve_chain_columns(
    invoice: &Invoice,
    chain: &ChainContext,
) -> (
    InvoiceNumber,
    Option<InvoiceNumber>,
    NaiveDate,
    Option<NaiveDate>,
) {
    if invoice.is_replacement() {
        let shown_number = chain
            .original_number
            .clone()
            .unwrap_or_else(|| invoice.number.clone());
        let shown_date = chain
            .original_generation_date
            .unwrap_or(invoice.generation_date);
        (
            shown_number,
            Some(invoice.number.clone()),
            shown_date,
            Some(invoice.generation_date),
        )
    } else if invoice.lifecycle == LifecycleStatus::Replaced {
        (
            invoice.number.clone(),
            invoice.replaced_by_number.clone(),
            invoice.generation_date,
            invoice.replacement_date,
        )
    } else {
        (
            invoice.number.clone(),
            None,
            invoice.generation_date,
            None,
        )
    }
}

/// Priority bucket for worklist ordering; lower sorts first
pub fn sort_bucket(projection: &InvoiceProjection) -> u8 {
    match projection.audit_status {
        AuditStatus::ReturnedByAuditor => return 1,
        AuditStatus::CorrectedByBiller => return 2,
        _ => {}
    }
    match projection.remaining {
        RemainingDisplay::Refacturar => 3,
        RemainingDisplay::DueToday => 4,
        _ => match projection.audit_status {
            AuditStatus::Pending => 5,
            AuditStatus::ReadyToFile => 6,
            AuditStatus::InFiler => 7,
            _ => 8,
        },
    }
}

/// Sorts a worklist: priority bucket ascending, then generation date descending
pub fn sort_worklist(rows: &mut [InvoiceProjection]) {
    rows.sort_by(|a, b| {
        sort_bucket(a)
            .cmp(&sort_bucket(b))
            .then(b.generation_date.cmp(&a.generation_date))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_serializes_like_the_worklist_cell() {
        let days = serde_json::to_value(RemainingDisplay::Days(-4)).unwrap();
        assert_eq!(days, serde_json::json!(-4));
        let due = serde_json::to_value(RemainingDisplay::DueToday).unwrap();
        assert_eq!(due, serde_json::json!("HoyVence"));
        let reissue = serde_json::to_value(RemainingDisplay::Refacturar).unwrap();
        assert_eq!(reissue, serde_json::json!("Refacturar"));
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(DisplayStatus::Overdue.to_string(), "Vencidas");
        assert_eq!(DisplayStatus::Replaced.to_string(), "Reemplazada");
        assert_eq!(RemainingDisplay::Days(7).to_string(), "7");
    }

    #[test]
    fn test_highlight_thresholds() {
        let healthy = derive_highlight(AuditStatus::Pending, RemainingDisplay::Days(4));
        assert_eq!(healthy, RowHighlight::Healthy);
        let warning = derive_highlight(AuditStatus::Pending, RemainingDisplay::Days(3));
        assert_eq!(warning, RowHighlight::Warning);
        let warning = derive_highlight(AuditStatus::Pending, RemainingDisplay::Days(1));
        assert_eq!(warning, RowHighlight::Warning);
        let reissue = derive_highlight(AuditStatus::Pending, RemainingDisplay::Refacturar);
        assert_eq!(reissue, RowHighlight::Reissue);
        // audit state wins over the deadline bucket
        let returned = derive_highlight(AuditStatus::ReturnedByAuditor, RemainingDisplay::Days(10));
        assert_eq!(returned, RowHighlight::Returned);
    }
}
