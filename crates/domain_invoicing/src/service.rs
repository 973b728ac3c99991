//! Invoicing domain service
//!
//! Orchestrates every user action over the storage port: creation,
//! detail edits, audit review, correction, filing delivery, reissue,
//! two-phase deletion, bulk intake, and the worklist projection. Role
//! gates are enforced here; transition preconditions live on the
//! aggregate. A failed action returns its typed error and leaves
//! storage untouched.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use core_kernel::{DeadlineEngine, InvoiceId, SessionContext};

use crate::catalog::{Catalog, ErrorKind, ServiceArea};
use crate::deletion::PendingDeletions;
use crate::error::InvoiceError;
use crate::intake::{parse_entry_date, validate_row, BatchOutcome, IntakeDefaults, IntakeRow};
use crate::invoice::{AuditPolicy, AuditStatus, BusinessKey, Invoice, InvoiceNumber};
use crate::status::{sort_worklist, InvoiceProjection, StatusResolver};
use crate::store::{InvoiceStore, ListFilter, PendingGroupCount, SummaryCounts};

/// Fields supplied when creating or editing an invoice
#[derive(Debug, Clone)]
pub struct InvoiceDraft {
    pub invoice_number: String,
    pub service_area: ServiceArea,
    pub biller: String,
    pub payer: String,
    /// Entry date string, `YYYY-MM-DD` or `DD/MM/YYYY`
    pub generation_date: String,
    /// SOAT form date, when it differs from the generation date
    pub soat_date: Option<String>,
}

/// Domain service bound to one store implementation
pub struct InvoiceService<S> {
    store: S,
    resolver: StatusResolver,
    policy: AuditPolicy,
    catalog: Catalog,
    deletions: PendingDeletions,
}

impl<S: InvoiceStore> InvoiceService<S> {
    /// Creates a service with the default audit policy and seeded catalog
    pub fn new(store: S, engine: DeadlineEngine) -> Self {
        Self {
            store,
            resolver: StatusResolver::new(engine),
            policy: AuditPolicy::default(),
            catalog: Catalog::seeded(),
            deletions: PendingDeletions::default(),
        }
    }

    /// Overrides the audit policy
    pub fn with_policy(mut self, policy: AuditPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Overrides the biller/payer catalog
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn resolver(&self) -> &StatusResolver {
        &self.resolver
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Validates a draft into a new invoice, without storing it
    fn draft_to_invoice(
        &self,
        draft: &InvoiceDraft,
        now: DateTime<Utc>,
    ) -> Result<Invoice, InvoiceError> {
        let number = InvoiceNumber::new(draft.invoice_number.trim())?;
        let biller = self.catalog.biller(&draft.biller)?;
        let payer = self.catalog.payer(&draft.payer)?;
        let generation_date = parse_entry_date(&draft.generation_date)?;
        let soat_date = draft
            .soat_date
            .as_deref()
            .map(parse_entry_date)
            .transpose()?;
        Invoice::new(
            number,
            draft.service_area,
            biller,
            payer,
            generation_date,
            soat_date,
            &self.policy,
            now,
        )
    }

    /// Creates a new invoice through the single-entry path
    pub async fn create(
        &self,
        ctx: &SessionContext,
        draft: InvoiceDraft,
        now: DateTime<Utc>,
    ) -> Result<InvoiceId, InvoiceError> {
        let invoice = self.draft_to_invoice(&draft, now)?;
        let id = self.store.insert(&invoice).await?;
        info!(
            user = %ctx.username,
            invoice = %invoice.number,
            area = %invoice.service_area,
            "invoice created"
        );
        Ok(id)
    }

    /// Updates an invoice's descriptive fields, preserving audit state
    pub async fn update_details(
        &self,
        ctx: &SessionContext,
        id: InvoiceId,
        draft: InvoiceDraft,
        now: DateTime<Utc>,
    ) -> Result<(), InvoiceError> {
        let record = self
            .store
            .fetch(id)
            .await?
            .ok_or_else(|| InvoiceError::not_found(id.to_string()))?;
        let mut invoice = record.invoice;

        invoice.number = InvoiceNumber::new(draft.invoice_number.trim())?;
        invoice.service_area = draft.service_area;
        invoice.biller = self.catalog.biller(&draft.biller)?;
        invoice.payer = self.catalog.payer(&draft.payer)?;
        let generation_date = parse_entry_date(&draft.generation_date)?;
        if generation_date > now.date_naive() {
            return Err(InvoiceError::validation(format!(
                "Generation date {} is in the future",
                generation_date
            )));
        }
        invoice.generation_date = generation_date;
        invoice.updated_at = now;

        if self
            .store
            .key_in_use(&invoice.business_key(), Some(id))
            .await?
        {
            return Err(InvoiceError::duplicate(format!(
                "Invoice number {} already exists",
                invoice.number
            )));
        }

        self.store.update(&invoice).await?;
        info!(user = %ctx.username, invoice = %invoice.number, "invoice details updated");
        Ok(())
    }

    /// Records an audit review outcome; auditor only
    pub async fn review(
        &self,
        ctx: &SessionContext,
        id: InvoiceId,
        status: AuditStatus,
        observation: Option<String>,
        error_kind: Option<ErrorKind>,
        now: DateTime<Utc>,
    ) -> Result<(), InvoiceError> {
        if !ctx.is_auditor() {
            return Err(InvoiceError::permission_denied(
                "Only auditors can review invoices",
            ));
        }
        let record = self
            .store
            .fetch(id)
            .await?
            .ok_or_else(|| InvoiceError::not_found(id.to_string()))?;
        let mut invoice = record.invoice;
        invoice.review(status, observation, error_kind, now)?;
        self.store.update(&invoice).await?;
        info!(user = %ctx.username, invoice = %invoice.number, status = %status, "audit review recorded");
        Ok(())
    }

    /// Marks a returned invoice as corrected; billing clerk only
    pub async fn mark_corrected(
        &self,
        ctx: &SessionContext,
        id: InvoiceId,
        now: DateTime<Utc>,
    ) -> Result<(), InvoiceError> {
        if !ctx.is_legalizador() {
            return Err(InvoiceError::permission_denied(
                "Only billing clerks can mark invoices as corrected",
            ));
        }
        let record = self
            .store
            .fetch(id)
            .await?
            .ok_or_else(|| InvoiceError::not_found(id.to_string()))?;
        let mut invoice = record.invoice;
        invoice.mark_corrected(now)?;
        self.store.update(&invoice).await?;
        info!(user = %ctx.username, invoice = %invoice.number, "marked corrected");
        Ok(())
    }

    /// Records or clears the filing-office delivery flag; auditor only
    pub async fn set_filing_delivered(
        &self,
        ctx: &SessionContext,
        id: InvoiceId,
        delivered: bool,
        now: DateTime<Utc>,
    ) -> Result<(), InvoiceError> {
        if !ctx.is_auditor() {
            return Err(InvoiceError::permission_denied(
                "Only auditors can record filing delivery",
            ));
        }
        let record = self
            .store
            .fetch(id)
            .await?
            .ok_or_else(|| InvoiceError::not_found(id.to_string()))?;
        let mut invoice = record.invoice;
        invoice.set_filing_delivered(delivered, now);
        self.store.update(&invoice).await?;
        Ok(())
    }

    /// Re-issues an overdue invoice under a new number
    ///
    /// Legal only while the worklist reports "Refacturar" for the row.
    /// The superseded tombstone and the replacement row are written in
    /// one storage transaction.
    pub async fn reissue(
        &self,
        ctx: &SessionContext,
        id: InvoiceId,
        new_number: &str,
        new_date: &str,
        now: DateTime<Utc>,
    ) -> Result<InvoiceId, InvoiceError> {
        let record = self
            .store
            .fetch(id)
            .await?
            .ok_or_else(|| InvoiceError::not_found(id.to_string()))?;
        let mut original = record.invoice;

        if !self.resolver.requires_reissue(&original, now.date_naive()) {
            return Err(InvoiceError::invalid_transition(format!(
                "Invoice {} is not flagged for reissue",
                original.number
            )));
        }

        let new_number = InvoiceNumber::new(new_number.trim())?;
        let new_date = parse_entry_date(new_date)?;
        if new_date > now.date_naive() {
            return Err(InvoiceError::validation(format!(
                "Reissue date {} is in the future",
                new_date
            )));
        }

        let replacement =
            Invoice::reissue_from(&original, new_number.clone(), new_date, &self.policy, now)?;
        if self
            .store
            .key_in_use(&replacement.business_key(), None)
            .await?
        {
            return Err(InvoiceError::duplicate(format!(
                "Invoice number {} already exists",
                new_number
            )));
        }
        original.supersede(new_number.clone(), new_date, now)?;

        let replacement_id = self.store.insert_replacement(&original, &replacement).await?;
        info!(
            user = %ctx.username,
            superseded = %original.number,
            replacement = %new_number,
            "invoice reissued"
        );
        Ok(replacement_id)
    }

    /// Marks an invoice for deletion; auditor only
    pub async fn request_deletion(
        &self,
        ctx: &SessionContext,
        id: InvoiceId,
        now: DateTime<Utc>,
    ) -> Result<(), InvoiceError> {
        if !ctx.is_auditor() {
            return Err(InvoiceError::permission_denied(
                "Only auditors can delete invoices",
            ));
        }
        if self.store.fetch(id).await?.is_none() {
            return Err(InvoiceError::not_found(id.to_string()));
        }
        self.deletions.mark(id, now);
        Ok(())
    }

    /// Clears a pending deletion mark
    pub fn cancel_deletion(&self, id: InvoiceId) {
        self.deletions.cancel(id);
    }

    /// Confirms a pending deletion and removes the row; auditor only
    pub async fn confirm_deletion(
        &self,
        ctx: &SessionContext,
        id: InvoiceId,
        now: DateTime<Utc>,
    ) -> Result<(), InvoiceError> {
        if !ctx.is_auditor() {
            return Err(InvoiceError::permission_denied(
                "Only auditors can delete invoices",
            ));
        }
        self.deletions.take_confirmed(id, now)?;
        if !self.store.delete(id).await? {
            return Err(InvoiceError::not_found(id.to_string()));
        }
        info!(user = %ctx.username, invoice_id = %id, "invoice deleted");
        Ok(())
    }

    /// Runs a bulk intake batch
    ///
    /// Per-row validation failures and duplicates are counted as
    /// skips and the batch continues; a storage outage aborts the run.
    pub async fn import_batch(
        &self,
        ctx: &SessionContext,
        defaults: &IntakeDefaults,
        rows: Vec<IntakeRow>,
        now: DateTime<Utc>,
    ) -> Result<BatchOutcome, InvoiceError> {
        let mut outcome = BatchOutcome::default();
        let today = now.date_naive();

        for (index, row) in rows.into_iter().enumerate() {
            outcome.total_rows += 1;
            let (number, generation_date) = match validate_row(&row, today) {
                Ok(valid) => valid,
                Err(error) => {
                    warn!(row = index + 1, %error, "intake row skipped");
                    outcome.skipped += 1;
                    continue;
                }
            };

            let invoice = match Invoice::new(
                number,
                defaults.service_area,
                defaults.biller.clone(),
                defaults.payer.clone(),
                generation_date,
                None,
                &self.policy,
                now,
            ) {
                Ok(invoice) => invoice,
                Err(error) => {
                    warn!(row = index + 1, %error, "intake row skipped");
                    outcome.skipped += 1;
                    continue;
                }
            };

            match self.store.insert(&invoice).await {
                Ok(_) => outcome.inserted += 1,
                Err(crate::store::StoreError::Duplicate(reason)) => {
                    warn!(row = index + 1, %reason, "intake row skipped: duplicate");
                    outcome.skipped += 1;
                }
                Err(other) => return Err(other.into()),
            }
        }

        info!(
            user = %ctx.username,
            total = outcome.total_rows,
            inserted = outcome.inserted,
            skipped = outcome.skipped,
            "bulk intake finished"
        );
        Ok(outcome)
    }

    /// Builds the sorted, display-ready worklist
    pub async fn worklist(
        &self,
        filter: &ListFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<InvoiceProjection>, InvoiceError> {
        let records = self.store.list(filter).await?;
        Ok(self.project_records(&records, now))
    }

    /// Projects already-fetched records into a sorted worklist
    ///
    /// Used by callers that front the list query with a cache.
    pub fn project_records(
        &self,
        records: &[crate::store::InvoiceRecord],
        now: DateTime<Utc>,
    ) -> Vec<InvoiceProjection> {
        let today = now.date_naive();
        let mut rows: Vec<InvoiceProjection> = records
            .iter()
            .map(|record| self.resolver.resolve(&record.invoice, &record.chain, today))
            .collect();
        sort_worklist(&mut rows);
        rows
    }

    /// Resolves one invoice into its worklist row
    pub async fn fetch_projection(
        &self,
        id: InvoiceId,
        now: DateTime<Utc>,
    ) -> Result<InvoiceProjection, InvoiceError> {
        let record = self
            .store
            .fetch(id)
            .await?
            .ok_or_else(|| InvoiceError::not_found(id.to_string()))?;
        Ok(self
            .resolver
            .resolve(&record.invoice, &record.chain, now.date_naive()))
    }

    /// Global worklist counters
    pub async fn summary(&self) -> Result<SummaryCounts, InvoiceError> {
        Ok(self.store.summary().await?)
    }

    /// Pending-invoice counts grouped by (biller, payer)
    pub async fn pending_groups(&self) -> Result<Vec<PendingGroupCount>, InvoiceError> {
        Ok(self.store.pending_by_biller_and_payer().await?)
    }

    /// Checks whether a business key is free, for form-side validation
    pub async fn key_available(&self, key: &BusinessKey) -> Result<bool, InvoiceError> {
        Ok(!self.store.key_in_use(key, None).await?)
    }
}
