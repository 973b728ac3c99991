//! In-memory invoice store
//!
//! A process-local [`InvoiceStore`] used by the test suite and small
//! demos. It mirrors the database adapter's guarantees: business-key
//! uniqueness on insert, and all-or-nothing reissue writes.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use core_kernel::InvoiceId;

use crate::invoice::{AuditStatus, BusinessKey, Invoice};
use crate::status::ChainContext;
use crate::store::{
    InvoiceRecord, InvoiceStore, ListFilter, PendingGroupCount, SearchField, StoreError,
    SummaryCounts,
};

/// HashMap-backed store with the same observable behavior as the
/// database adapter
#[derive(Debug, Default)]
pub struct MemoryInvoiceStore {
    rows: RwLock<HashMap<InvoiceId, Invoice>>,
}

impl MemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored
    pub fn len(&self) -> usize {
        self.rows.read().expect("store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key_taken(
        rows: &HashMap<InvoiceId, Invoice>,
        key: &BusinessKey,
        exclude: Option<InvoiceId>,
    ) -> bool {
        rows.values()
            .any(|row| Some(row.id) != exclude && row.business_key() == *key)
    }

    fn chain_for(rows: &HashMap<InvoiceId, Invoice>, invoice: &Invoice) -> ChainContext {
        let original = invoice
            .original_invoice_id
            .and_then(|original_id| rows.get(&original_id));
        ChainContext {
            original_number: original.map(|o| o.number.clone()),
            original_generation_date: original.map(|o| o.generation_date),
        }
    }

    fn matches(invoice: &Invoice, filter: &ListFilter) -> bool {
        let (Some(term), Some(field)) = (&filter.term, filter.field) else {
            return true;
        };
        let term = term.to_lowercase();
        let haystack = match field {
            SearchField::InvoiceNumber => invoice.number.as_str().to_string(),
            SearchField::Biller => invoice.biller.as_str().to_string(),
            SearchField::Payer => invoice.payer.as_str().to_string(),
            SearchField::ServiceArea => invoice.service_area.label().to_string(),
            SearchField::AuditStatus => invoice.audit_status.label().to_string(),
        };
        haystack.to_lowercase().contains(&term)
    }
}

#[async_trait]
impl InvoiceStore for MemoryInvoiceStore {
    async fn insert(&self, invoice: &Invoice) -> Result<InvoiceId, StoreError> {
        let mut rows = self.rows.write().expect("store lock poisoned");
        if Self::key_taken(&rows, &invoice.business_key(), None) {
            return Err(StoreError::Duplicate(format!(
                "Invoice number {} already exists for this biller/payer/area",
                invoice.number
            )));
        }
        rows.insert(invoice.id, invoice.clone());
        Ok(invoice.id)
    }

    async fn fetch(&self, id: InvoiceId) -> Result<Option<InvoiceRecord>, StoreError> {
        let rows = self.rows.read().expect("store lock poisoned");
        Ok(rows.get(&id).map(|invoice| InvoiceRecord {
            chain: Self::chain_for(&rows, invoice),
            invoice: invoice.clone(),
        }))
    }

    async fn update(&self, invoice: &Invoice) -> Result<(), StoreError> {
        let mut rows = self.rows.write().expect("store lock poisoned");
        if Self::key_taken(&rows, &invoice.business_key(), Some(invoice.id)) {
            return Err(StoreError::Duplicate(format!(
                "Invoice number {} already exists for this biller/payer/area",
                invoice.number
            )));
        }
        if !rows.contains_key(&invoice.id) {
            return Err(StoreError::NotFound(invoice.id.to_string()));
        }
        rows.insert(invoice.id, invoice.clone());
        Ok(())
    }

    async fn delete(&self, id: InvoiceId) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().expect("store lock poisoned");
        Ok(rows.remove(&id).is_some())
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<InvoiceRecord>, StoreError> {
        let rows = self.rows.read().expect("store lock poisoned");
        let mut records: Vec<InvoiceRecord> = rows
            .values()
            .filter(|invoice| Self::matches(invoice, filter))
            .map(|invoice| InvoiceRecord {
                chain: Self::chain_for(&rows, invoice),
                invoice: invoice.clone(),
            })
            .collect();
        // newest first, same ordering as the database adapter
        records.sort_by(|a, b| b.invoice.created_at.cmp(&a.invoice.created_at));
        Ok(records)
    }

    async fn key_in_use(
        &self,
        key: &BusinessKey,
        exclude: Option<InvoiceId>,
    ) -> Result<bool, StoreError> {
        let rows = self.rows.read().expect("store lock poisoned");
        Ok(Self::key_taken(&rows, key, exclude))
    }

    async fn insert_replacement(
        &self,
        superseded: &Invoice,
        replacement: &Invoice,
    ) -> Result<InvoiceId, StoreError> {
        let mut rows = self.rows.write().expect("store lock poisoned");
        if !rows.contains_key(&superseded.id) {
            return Err(StoreError::NotFound(superseded.id.to_string()));
        }
        if Self::key_taken(&rows, &replacement.business_key(), None) {
            return Err(StoreError::Duplicate(format!(
                "Invoice number {} already exists for this biller/payer/area",
                replacement.number
            )));
        }
        // both writes under one lock: all-or-nothing, like the DB transaction
        rows.insert(superseded.id, superseded.clone());
        rows.insert(replacement.id, replacement.clone());
        Ok(replacement.id)
    }

    async fn summary(&self) -> Result<SummaryCounts, StoreError> {
        let rows = self.rows.read().expect("store lock poisoned");
        let mut counts = SummaryCounts::default();
        for invoice in rows.values() {
            counts.total += 1;
            match invoice.audit_status {
                AuditStatus::Pending => counts.pending += 1,
                AuditStatus::ReadyToFile => counts.ready_to_file += 1,
                AuditStatus::ReturnedByAuditor | AuditStatus::CorrectedByBiller => {
                    counts.returned_or_corrected += 1
                }
                _ => {}
            }
        }
        Ok(counts)
    }

    async fn pending_by_biller_and_payer(&self) -> Result<Vec<PendingGroupCount>, StoreError> {
        let rows = self.rows.read().expect("store lock poisoned");
        let mut groups: HashMap<(String, String), u64> = HashMap::new();
        for invoice in rows.values() {
            if invoice.audit_status == AuditStatus::Pending {
                *groups
                    .entry((
                        invoice.biller.as_str().to_string(),
                        invoice.payer.as_str().to_string(),
                    ))
                    .or_default() += 1;
            }
        }
        let mut counts: Vec<PendingGroupCount> = groups
            .into_iter()
            .map(|((biller, payer), count)| PendingGroupCount {
                biller,
                payer,
                count,
            })
            .collect();
        counts.sort_by(|a, b| a.biller.cmp(&b.biller).then(a.payer.cmp(&b.payer)));
        Ok(counts)
    }
}
