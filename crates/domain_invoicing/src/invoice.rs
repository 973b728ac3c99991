//! Invoice aggregate
//!
//! Models the invoice lifecycle: a row is either `Active` or a
//! `Replaced` tombstone, with an orthogonal audit sub-state that moves
//! between pending, ready-to-file, in-filer, returned, and corrected.
//! Transition methods validate their preconditions and mutate nothing
//! on failure; role gates live one layer up, in the service.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use core_kernel::{InvoiceId, SoatDetailId};

use crate::catalog::{Biller, ErrorKind, Payer, ServiceArea};
use crate::error::InvoiceError;

/// Lifecycle status of an invoice row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    /// The invoice is live
    Active,
    /// The invoice was superseded by a reissue; terminal for this row
    Replaced,
}

impl LifecycleStatus {
    pub fn label(&self) -> &'static str {
        match self {
            LifecycleStatus::Active => "Activa",
            LifecycleStatus::Replaced => "Reemplazada",
        }
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LifecycleStatus {
    type Err = InvoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Activa" => Ok(LifecycleStatus::Active),
            "Reemplazada" => Ok(LifecycleStatus::Replaced),
            other => Err(InvoiceError::validation(format!(
                "Unknown lifecycle status: {}",
                other
            ))),
        }
    }
}

/// Audit sub-state of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    /// Awaiting first audit pass
    Pending,
    /// Audit passed; ready to hand to the filing office
    ReadyToFile,
    /// Physically with the filing office
    InFiler,
    /// Returned by the auditor with an error classification
    ReturnedByAuditor,
    /// Corrected by the biller; awaiting re-review
    CorrectedByBiller,
    /// Accepted by the filing office; terminal
    FiledAndAccepted,
}

impl AuditStatus {
    pub fn all() -> [AuditStatus; 6] {
        [
            AuditStatus::Pending,
            AuditStatus::ReadyToFile,
            AuditStatus::InFiler,
            AuditStatus::ReturnedByAuditor,
            AuditStatus::CorrectedByBiller,
            AuditStatus::FiledAndAccepted,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            AuditStatus::Pending => "Pendiente",
            AuditStatus::ReadyToFile => "Lista para Radicar",
            AuditStatus::InFiler => "En Radicador",
            AuditStatus::ReturnedByAuditor => "Devuelta por Auditor",
            AuditStatus::CorrectedByBiller => "Corregida por Legalizador",
            AuditStatus::FiledAndAccepted => "Radicada y Aceptada",
        }
    }

    /// Returns true if this state suspends the reissue flag
    ///
    /// Invoices in these states never display "Refacturar" or
    /// "HoyVence" regardless of how overdue they are: the error-path
    /// states are already being worked, and the filer-path states have
    /// left the biller's hands.
    pub fn suspends_reissue(&self) -> bool {
        matches!(
            self,
            AuditStatus::ReturnedByAuditor
                | AuditStatus::CorrectedByBiller
                | AuditStatus::InFiler
                | AuditStatus::FiledAndAccepted
        )
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AuditStatus {
    type Err = InvoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuditStatus::all()
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| InvoiceError::validation(format!("Unknown audit status: {}", s)))
    }
}

/// A validated invoice number: one or more ASCII digits
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InvoiceNumber(String);

impl InvoiceNumber {
    pub fn new(raw: impl Into<String>) -> Result<Self, InvoiceError> {
        let raw = raw.into();
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvoiceError::validation(format!(
                "Invoice number must contain only digits: '{}'",
                raw
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for InvoiceNumber {
    type Err = InvoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for InvoiceNumber {
    type Error = InvoiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<InvoiceNumber> for String {
    fn from(number: InvoiceNumber) -> String {
        number.0
    }
}

/// Optional SOAT sidecar record, present only for SOAT-area invoices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoatDetail {
    pub id: SoatDetailId,
    pub generation_date: NaiveDate,
}

impl SoatDetail {
    pub fn new(generation_date: NaiveDate) -> Self {
        Self {
            id: SoatDetailId::new_v7(),
            generation_date,
        }
    }
}

/// The composite business key under which invoice numbers must be unique
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BusinessKey {
    pub number: InvoiceNumber,
    pub biller: Biller,
    pub payer: Payer,
    pub service_area: ServiceArea,
}

/// Decides the initial audit status for a new invoice
///
/// Some service areas bypass the audit queue and enter ready-to-file
/// directly. The bypass set is configuration, not a hardcoded pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditPolicy {
    bypass_areas: BTreeSet<ServiceArea>,
}

impl Default for AuditPolicy {
    fn default() -> Self {
        Self {
            bypass_areas: BTreeSet::from([ServiceArea::Hospitalization, ServiceArea::Emergency]),
        }
    }
}

impl AuditPolicy {
    /// Creates a policy with no bypass areas: everything starts pending
    pub fn audit_everything() -> Self {
        Self {
            bypass_areas: BTreeSet::new(),
        }
    }

    /// Adds an area to the bypass set
    pub fn bypassing(mut self, area: ServiceArea) -> Self {
        self.bypass_areas.insert(area);
        self
    }

    /// Initial audit status for an invoice in the given area
    pub fn initial_status(&self, area: ServiceArea) -> AuditStatus {
        if self.bypass_areas.contains(&area) {
            AuditStatus::ReadyToFile
        } else {
            AuditStatus::Pending
        }
    }
}

/// An invoice moving through the legalization and filing workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier
    pub id: InvoiceId,
    /// Business invoice number
    pub number: InvoiceNumber,
    /// Service area
    pub service_area: ServiceArea,
    /// Billing clerk who legalized the invoice
    pub biller: Biller,
    /// Insurer billed
    pub payer: Payer,
    /// Date the invoice was generated; the deadline clock starts here
    pub generation_date: NaiveDate,
    /// When the invoice was first entered into the system
    pub delivered_at: DateTime<Utc>,
    /// Lifecycle status
    pub lifecycle: LifecycleStatus,
    /// Audit sub-state
    pub audit_status: AuditStatus,
    /// Auditor's free-text observation
    pub audit_observation: Option<String>,
    /// Error classification, required when returned by the auditor
    pub error_kind: Option<ErrorKind>,
    /// Back-reference set on a replacement row, pointing at the row it supersedes
    pub original_invoice_id: Option<InvoiceId>,
    /// Successor number, set on the superseded row once replaced
    pub replaced_by_number: Option<InvoiceNumber>,
    /// Date the row was superseded, if ever
    pub replacement_date: Option<NaiveDate>,
    /// When the invoice was handed to the filing office, if it has been
    pub filing_delivered_at: Option<DateTime<Utc>>,
    /// SOAT sidecar, present only for SOAT-area invoices
    pub soat_detail: Option<SoatDetail>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Creates a new active invoice
    ///
    /// The generation date is validated once, at entry: it must not be
    /// in the future relative to `now`. SOAT-area invoices get their
    /// sidecar automatically; `soat_date` overrides the sidecar date
    /// when the paper SOAT form carries a different one.
    pub fn new(
        number: InvoiceNumber,
        service_area: ServiceArea,
        biller: Biller,
        payer: Payer,
        generation_date: NaiveDate,
        soat_date: Option<NaiveDate>,
        policy: &AuditPolicy,
        now: DateTime<Utc>,
    ) -> Result<Self, InvoiceError> {
        if generation_date > now.date_naive() {
            return Err(InvoiceError::validation(format!(
                "Generation date {} is in the future",
                generation_date
            )));
        }

        let soat_detail = (service_area == ServiceArea::Soat)
            .then(|| SoatDetail::new(soat_date.unwrap_or(generation_date)));

        Ok(Self {
            id: InvoiceId::new_v7(),
            number,
            service_area,
            biller,
            payer,
            generation_date,
            delivered_at: now,
            lifecycle: LifecycleStatus::Active,
            audit_status: policy.initial_status(service_area),
            audit_observation: None,
            error_kind: None,
            original_invoice_id: None,
            replaced_by_number: None,
            replacement_date: None,
            filing_delivered_at: None,
            soat_detail,
            created_at: now,
            updated_at: now,
        })
    }

    /// The composite key under which this invoice must be unique
    pub fn business_key(&self) -> BusinessKey {
        BusinessKey {
            number: self.number.clone(),
            biller: self.biller.clone(),
            payer: self.payer.clone(),
            service_area: self.service_area,
        }
    }

    /// Returns true if this row supersedes another invoice
    pub fn is_replacement(&self) -> bool {
        self.original_invoice_id.is_some()
    }

    /// The date the filing deadline clock runs from
    ///
    /// After a reissue the clock restarts at the replacement date;
    /// otherwise it runs from the generation date.
    pub fn deadline_reference_date(&self) -> NaiveDate {
        self.replacement_date.unwrap_or(self.generation_date)
    }

    /// Records an audit review outcome
    ///
    /// The auditor may set any audit status. Returning an invoice
    /// requires an error classification; the observation is optional
    /// free text.
    pub fn review(
        &mut self,
        status: AuditStatus,
        observation: Option<String>,
        error_kind: Option<ErrorKind>,
        now: DateTime<Utc>,
    ) -> Result<(), InvoiceError> {
        if status == AuditStatus::ReturnedByAuditor && error_kind.is_none() {
            return Err(InvoiceError::validation(
                "Returning an invoice requires an error kind",
            ));
        }
        self.audit_status = status;
        self.audit_observation = observation;
        self.error_kind = error_kind;
        self.updated_at = now;
        Ok(())
    }

    /// Marks a returned invoice as corrected by the biller
    ///
    /// Only legal from `ReturnedByAuditor`. The auditor's observation
    /// and error kind stay visible until the next audit pass.
    pub fn mark_corrected(&mut self, now: DateTime<Utc>) -> Result<(), InvoiceError> {
        if self.audit_status != AuditStatus::ReturnedByAuditor {
            return Err(InvoiceError::invalid_transition(format!(
                "Only invoices returned by the auditor can be corrected; current status is '{}'",
                self.audit_status
            )));
        }
        self.audit_status = AuditStatus::CorrectedByBiller;
        self.updated_at = now;
        Ok(())
    }

    /// Records or clears the filing-office delivery flag
    ///
    /// Setting the flag moves `ReadyToFile` to `InFiler`; clearing it
    /// moves back. In any other audit state the status is untouched but
    /// the timestamp is still recorded or cleared.
    pub fn set_filing_delivered(&mut self, delivered: bool, now: DateTime<Utc>) {
        match (self.audit_status, delivered) {
            (AuditStatus::ReadyToFile, true) => self.audit_status = AuditStatus::InFiler,
            (AuditStatus::InFiler, false) => self.audit_status = AuditStatus::ReadyToFile,
            _ => {}
        }
        self.filing_delivered_at = delivered.then_some(now);
        self.updated_at = now;
    }

    /// Turns this row into a `Replaced` tombstone
    ///
    /// Called when a reissue spawns the linked replacement row.
    pub fn supersede(
        &mut self,
        successor_number: InvoiceNumber,
        replacement_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<(), InvoiceError> {
        if self.lifecycle == LifecycleStatus::Replaced {
            return Err(InvoiceError::invalid_transition(format!(
                "Invoice {} is already replaced",
                self.number
            )));
        }
        self.lifecycle = LifecycleStatus::Replaced;
        self.replaced_by_number = Some(successor_number);
        self.replacement_date = Some(replacement_date);
        self.updated_at = now;
        Ok(())
    }

    /// Builds the replacement row for a reissued invoice
    ///
    /// The replacement keeps the original's classification, starts a
    /// fresh deadline clock at `new_date`, goes back through the
    /// standard audit entry point, and carries the back-reference to
    /// the superseded row.
    pub fn reissue_from(
        original: &Invoice,
        new_number: InvoiceNumber,
        new_date: NaiveDate,
        policy: &AuditPolicy,
        now: DateTime<Utc>,
    ) -> Result<Self, InvoiceError> {
        let mut replacement = Invoice::new(
            new_number,
            original.service_area,
            original.biller.clone(),
            original.payer.clone(),
            new_date,
            original.soat_detail.as_ref().map(|d| d.generation_date),
            policy,
            now,
        )?;
        replacement.original_invoice_id = Some(original.id);
        Ok(replacement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 14, 30, 0).unwrap()
    }

    fn sample_invoice(area: ServiceArea) -> Invoice {
        let catalog = crate::catalog::Catalog::seeded();
        Invoice::new(
            InvoiceNumber::new("100234").unwrap(),
            area,
            catalog.biller("ANDREA CEBALLOS").unwrap(),
            catalog.payer("NUEVA EPS").unwrap(),
            date(2025, 6, 2),
            None,
            &AuditPolicy::default(),
            now(),
        )
        .unwrap()
    }

    #[test]
    fn test_number_must_be_digits() {
        assert!(InvoiceNumber::new("12345").is_ok());
        assert!(InvoiceNumber::new("12A45").is_err());
        assert!(InvoiceNumber::new("").is_err());
        assert!(InvoiceNumber::new("123-45").is_err());
    }

    #[test]
    fn test_future_generation_date_is_rejected() {
        let catalog = crate::catalog::Catalog::seeded();
        let result = Invoice::new(
            InvoiceNumber::new("1").unwrap(),
            ServiceArea::Outpatient,
            catalog.biller("ANDREA CEBALLOS").unwrap(),
            catalog.payer("NUEVA EPS").unwrap(),
            date(2025, 6, 11),
            None,
            &AuditPolicy::default(),
            now(),
        );
        assert!(matches!(result, Err(InvoiceError::Validation(_))));
    }

    #[test]
    fn test_audit_default_per_service_area() {
        assert_eq!(
            sample_invoice(ServiceArea::Outpatient).audit_status,
            AuditStatus::Pending
        );
        assert_eq!(
            sample_invoice(ServiceArea::Hospitalization).audit_status,
            AuditStatus::ReadyToFile
        );
        assert_eq!(
            sample_invoice(ServiceArea::Emergency).audit_status,
            AuditStatus::ReadyToFile
        );
    }

    #[test]
    fn test_soat_sidecar_created_for_soat_area() {
        let invoice = sample_invoice(ServiceArea::Soat);
        let detail = invoice.soat_detail.expect("SOAT detail missing");
        assert_eq!(detail.generation_date, invoice.generation_date);

        assert!(sample_invoice(ServiceArea::Vaccination).soat_detail.is_none());
    }

    #[test]
    fn test_return_requires_error_kind() {
        let mut invoice = sample_invoice(ServiceArea::Outpatient);
        let result = invoice.review(AuditStatus::ReturnedByAuditor, None, None, now());
        assert!(matches!(result, Err(InvoiceError::Validation(_))));
        assert_eq!(invoice.audit_status, AuditStatus::Pending);
    }

    #[test]
    fn test_correction_only_from_returned() {
        let mut invoice = sample_invoice(ServiceArea::Outpatient);
        assert!(matches!(
            invoice.mark_corrected(now()),
            Err(InvoiceError::InvalidTransition(_))
        ));

        invoice
            .review(
                AuditStatus::ReturnedByAuditor,
                Some("missing signature".to_string()),
                Some(ErrorKind::Signatures),
                now(),
            )
            .unwrap();
        invoice.mark_corrected(now()).unwrap();
        assert_eq!(invoice.audit_status, AuditStatus::CorrectedByBiller);
        // observation and error kind survive the correction
        assert_eq!(invoice.audit_observation.as_deref(), Some("missing signature"));
        assert_eq!(invoice.error_kind, Some(ErrorKind::Signatures));
    }

    #[test]
    fn test_filing_toggle_moves_between_ready_and_filer() {
        let mut invoice = sample_invoice(ServiceArea::Emergency);
        assert_eq!(invoice.audit_status, AuditStatus::ReadyToFile);

        invoice.set_filing_delivered(true, now());
        assert_eq!(invoice.audit_status, AuditStatus::InFiler);
        assert!(invoice.filing_delivered_at.is_some());

        invoice.set_filing_delivered(false, now());
        assert_eq!(invoice.audit_status, AuditStatus::ReadyToFile);
        assert!(invoice.filing_delivered_at.is_none());
    }

    #[test]
    fn test_filing_toggle_outside_filer_states_keeps_status() {
        let mut invoice = sample_invoice(ServiceArea::Outpatient);
        invoice.set_filing_delivered(true, now());
        assert_eq!(invoice.audit_status, AuditStatus::Pending);
        // the timestamp is still recorded
        assert!(invoice.filing_delivered_at.is_some());
    }

    #[test]
    fn test_supersede_is_terminal() {
        let mut invoice = sample_invoice(ServiceArea::Outpatient);
        invoice
            .supersede(InvoiceNumber::new("100300").unwrap(), date(2025, 6, 9), now())
            .unwrap();
        assert_eq!(invoice.lifecycle, LifecycleStatus::Replaced);
        assert!(invoice.replaced_by_number.is_some());

        let again = invoice.supersede(InvoiceNumber::new("100301").unwrap(), date(2025, 6, 9), now());
        assert!(matches!(again, Err(InvoiceError::InvalidTransition(_))));
    }

    #[test]
    fn test_reissue_links_replacement_to_original() {
        let original = sample_invoice(ServiceArea::Outpatient);
        let replacement = Invoice::reissue_from(
            &original,
            InvoiceNumber::new("100300").unwrap(),
            date(2025, 6, 9),
            &AuditPolicy::default(),
            now(),
        )
        .unwrap();

        assert_eq!(replacement.original_invoice_id, Some(original.id));
        assert_eq!(replacement.biller, original.biller);
        assert_eq!(replacement.payer, original.payer);
        assert_eq!(replacement.audit_status, AuditStatus::Pending);
        assert_eq!(replacement.generation_date, date(2025, 6, 9));
    }

    #[test]
    fn test_deadline_reference_prefers_replacement_date() {
        let mut invoice = sample_invoice(ServiceArea::Outpatient);
        assert_eq!(invoice.deadline_reference_date(), date(2025, 6, 2));

        invoice
            .supersede(InvoiceNumber::new("100300").unwrap(), date(2025, 6, 9), now())
            .unwrap();
        assert_eq!(invoice.deadline_reference_date(), date(2025, 6, 9));
    }
}
