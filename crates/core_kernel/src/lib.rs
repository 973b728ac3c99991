//! Core Kernel - Foundational types and utilities for the invoice traceability system
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Business-day calendar with per-year holiday configuration
//! - Statutory filing deadline engine
//! - Common identifiers and value objects

pub mod calendar;
pub mod deadline;
pub mod error;
pub mod identifiers;
pub mod session;

pub use calendar::BusinessCalendar;
pub use deadline::{DeadlineEngine, FILING_WINDOW_BUSINESS_DAYS};
pub use error::CoreError;
pub use identifiers::{ImportBatchId, InvoiceId, SoatDetailId};
pub use session::{FormMode, Role, SessionContext};
