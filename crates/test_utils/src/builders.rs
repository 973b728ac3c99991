//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! These builders allow tests to specify only the relevant fields while using
//! defaults for everything else.

use chrono::{DateTime, NaiveDate, Utc};
use fake::faker::lorem::en::Sentence;
use fake::Fake;

use domain_invoicing::{
    AuditPolicy, AuditStatus, Biller, ErrorKind, Invoice, InvoiceNumber, Payer, ServiceArea,
};

use crate::fixtures::{CatalogFixtures, TemporalFixtures};

/// Builder for constructing test invoices
pub struct TestInvoiceBuilder {
    number: String,
    service_area: ServiceArea,
    biller: Biller,
    payer: Payer,
    generation_date: NaiveDate,
    entered_at: DateTime<Utc>,
    policy: AuditPolicy,
    audit_status: Option<AuditStatus>,
    observation: Option<String>,
    error_kind: Option<ErrorKind>,
}

impl Default for TestInvoiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestInvoiceBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            number: "100234".to_string(),
            service_area: ServiceArea::Outpatient,
            biller: CatalogFixtures::biller(),
            payer: CatalogFixtures::payer(),
            generation_date: TemporalFixtures::recent_generation_date(),
            entered_at: TemporalFixtures::entry_timestamp(),
            policy: AuditPolicy::default(),
            audit_status: None,
            observation: None,
            error_kind: None,
        }
    }

    /// Sets the invoice number
    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = number.into();
        self
    }

    /// Sets the service area
    pub fn with_service_area(mut self, area: ServiceArea) -> Self {
        self.service_area = area;
        self
    }

    /// Sets the biller
    pub fn with_biller(mut self, biller: Biller) -> Self {
        self.biller = biller;
        self
    }

    /// Sets the payer
    pub fn with_payer(mut self, payer: Payer) -> Self {
        self.payer = payer;
        self
    }

    /// Sets the generation date
    pub fn with_generation_date(mut self, date: NaiveDate) -> Self {
        self.generation_date = date;
        self
    }

    /// Sets the entry timestamp
    pub fn entered_at(mut self, at: DateTime<Utc>) -> Self {
        self.entered_at = at;
        self
    }

    /// Sets the audit policy used at entry
    pub fn with_policy(mut self, policy: AuditPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Forces the audit status after creation
    pub fn with_audit_status(mut self, status: AuditStatus) -> Self {
        self.audit_status = Some(status);
        self
    }

    /// Marks the invoice as returned with a generated observation
    pub fn returned(mut self, error_kind: ErrorKind) -> Self {
        self.audit_status = Some(AuditStatus::ReturnedByAuditor);
        self.observation = Some(Sentence(3..8).fake());
        self.error_kind = Some(error_kind);
        self
    }

    /// Builds the invoice
    ///
    /// # Panics
    ///
    /// Panics on invalid builder input; test data is expected to be valid.
    pub fn build(self) -> Invoice {
        let mut invoice = Invoice::new(
            InvoiceNumber::new(self.number).expect("invalid test invoice number"),
            self.service_area,
            self.biller,
            self.payer,
            self.generation_date,
            None,
            &self.policy,
            self.entered_at,
        )
        .expect("invalid test invoice");

        if let Some(status) = self.audit_status {
            invoice
                .review(status, self.observation, self.error_kind, self.entered_at)
                .expect("invalid test audit status");
        }
        invoice
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let invoice = TestInvoiceBuilder::new().build();
        assert_eq!(invoice.number.as_str(), "100234");
        assert_eq!(invoice.audit_status, AuditStatus::Pending);
        assert!(invoice.soat_detail.is_none());
    }

    #[test]
    fn test_returned_builder() {
        let invoice = TestInvoiceBuilder::new().returned(ErrorKind::Tariff).build();
        assert_eq!(invoice.audit_status, AuditStatus::ReturnedByAuditor);
        assert!(invoice.audit_observation.is_some());
        assert_eq!(invoice.error_kind, Some(ErrorKind::Tariff));
    }
}
