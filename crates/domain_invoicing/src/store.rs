//! Storage port for invoice persistence
//!
//! The domain talks to persistence through this trait; adapters live in
//! the infrastructure crate (PostgreSQL) and in-process (in-memory, for
//! tests and demos). Implementations own atomicity: multi-row
//! mutations happen in one transaction, and business-key uniqueness is
//! a store constraint rather than an application check-then-act.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::InvoiceId;

use crate::error::InvoiceError;
use crate::invoice::{BusinessKey, Invoice};
use crate::status::ChainContext;

/// Errors surfaced by store implementations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Business-key uniqueness violated
    #[error("Duplicate key: {0}")]
    Duplicate(String),

    /// Row does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Connection or transaction failure; nothing was written
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for InvoiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Duplicate(msg) => InvoiceError::DuplicateKey(msg),
            StoreError::NotFound(msg) => InvoiceError::NotFound(msg),
            StoreError::Unavailable(msg) => InvoiceError::StorageUnavailable(msg),
        }
    }
}

/// An invoice row together with its replacement-chain context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub invoice: Invoice,
    pub chain: ChainContext,
}

/// Which column a worklist search matches against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    InvoiceNumber,
    Biller,
    Payer,
    ServiceArea,
    AuditStatus,
}

/// Worklist list filter; empty means "everything"
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListFilter {
    pub term: Option<String>,
    pub field: Option<SearchField>,
}

impl ListFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn matching(field: SearchField, term: impl Into<String>) -> Self {
        Self {
            term: Some(term.into()),
            field: Some(field),
        }
    }
}

/// Global worklist counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryCounts {
    pub total: u64,
    pub pending: u64,
    pub ready_to_file: u64,
    pub returned_or_corrected: u64,
}

/// Pending-invoice count for one (biller, payer) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingGroupCount {
    pub biller: String,
    pub payer: String,
    pub count: u64,
}

/// Persistence operations the domain needs
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Inserts a new invoice; fails with `Duplicate` on a business-key collision
    async fn insert(&self, invoice: &Invoice) -> Result<InvoiceId, StoreError>;

    /// Fetches one invoice with its chain context
    async fn fetch(&self, id: InvoiceId) -> Result<Option<InvoiceRecord>, StoreError>;

    /// Updates an existing invoice in place
    async fn update(&self, invoice: &Invoice) -> Result<(), StoreError>;

    /// Deletes an invoice; returns false when the row did not exist
    async fn delete(&self, id: InvoiceId) -> Result<bool, StoreError>;

    /// Lists invoices with chain context, optionally filtered
    async fn list(&self, filter: &ListFilter) -> Result<Vec<InvoiceRecord>, StoreError>;

    /// Returns true if the business key is taken by a row other than `exclude`
    async fn key_in_use(
        &self,
        key: &BusinessKey,
        exclude: Option<InvoiceId>,
    ) -> Result<bool, StoreError>;

    /// Writes a reissue atomically: the superseded tombstone update and
    /// the replacement insert either both happen or neither does
    async fn insert_replacement(
        &self,
        superseded: &Invoice,
        replacement: &Invoice,
    ) -> Result<InvoiceId, StoreError>;

    /// Computes the global worklist counters
    async fn summary(&self) -> Result<SummaryCounts, StoreError>;

    /// Counts pending invoices grouped by (biller, payer)
    async fn pending_by_biller_and_payer(&self) -> Result<Vec<PendingGroupCount>, StoreError>;
}
