//! Repository implementations for domain entities
//!
//! This module provides the concrete repository that handles database
//! access for the invoice aggregate. The repository encapsulates SQL
//! queries and maps between database rows and domain types.
//!
//! # Architecture
//!
//! - Business-key uniqueness enforced by a database constraint
//! - Transaction support for multi-row mutations (reissue pairs)
//! - Named-column row mapping; positional access never crosses a
//!   module boundary

pub mod invoices;

pub use invoices::InvoiceRepository;
