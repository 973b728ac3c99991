//! Invoicing Domain - Lifecycle, Audit Workflow, and Deadline Status
//!
//! This crate models the traceability of medical billing invoices from
//! legalization through audit to the filing office:
//!
//! - **Invoice aggregate**: active/replaced lifecycle with an
//!   orthogonal audit sub-state and the reissue (refacturación) chain
//! - **Status derivation**: folds audit state, replacement linkage, and
//!   the business-day deadline distance into one display status with a
//!   deterministic worklist ordering
//! - **Bulk intake**: batch validation of raw (number, date) pairs with
//!   skip-and-count semantics
//! - **Storage port**: the persistence contract implemented by the
//!   database adapter and an in-memory double
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_invoicing::{InvoiceService, InvoiceDraft, MemoryInvoiceStore};
//! use core_kernel::{BusinessCalendar, DeadlineEngine};
//!
//! let engine = DeadlineEngine::new(BusinessCalendar::new());
//! let service = InvoiceService::new(MemoryInvoiceStore::new(), engine);
//! let id = service.create(&ctx, draft, Utc::now()).await?;
//! ```

pub mod catalog;
pub mod deletion;
pub mod error;
pub mod intake;
pub mod invoice;
pub mod memory;
pub mod service;
pub mod status;
pub mod store;

pub use catalog::{Biller, Catalog, ErrorKind, Payer, ServiceArea};
pub use deletion::PendingDeletions;
pub use error::InvoiceError;
pub use intake::{BatchOutcome, IntakeDefaults, IntakeRow};
pub use invoice::{
    AuditPolicy, AuditStatus, BusinessKey, Invoice, InvoiceNumber, LifecycleStatus, SoatDetail,
};
pub use memory::MemoryInvoiceStore;
pub use service::{InvoiceDraft, InvoiceService};
pub use status::{
    sort_worklist, ChainContext, DisplayStatus, InvoiceProjection, RemainingDisplay, RowHighlight,
    StatusResolver,
};
pub use store::{
    InvoiceRecord, InvoiceStore, ListFilter, PendingGroupCount, SearchField, StoreError,
    SummaryCounts,
};
