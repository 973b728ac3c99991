//! Invoicing domain errors

use thiserror::Error;

/// Errors that can occur in the invoicing domain
///
/// Every failed action returns one of these variants and performs no
/// mutation; callers must inspect the outcome before assuming success.
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// Malformed input: bad date format, non-numeric invoice number,
    /// future date, missing required field
    #[error("Validation error: {0}")]
    Validation(String),

    /// Business-key collision on create, update, or reissue
    #[error("Duplicate invoice: {0}")]
    DuplicateKey(String),

    /// Role-gated action attempted by the wrong role
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Transition precondition not met
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Operation references a nonexistent invoice
    #[error("Invoice not found: {0}")]
    NotFound(String),

    /// Storage connection or transaction failure; the action was not applied
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl InvoiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        InvoiceError::Validation(message.into())
    }

    pub fn duplicate(message: impl Into<String>) -> Self {
        InvoiceError::DuplicateKey(message.into())
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        InvoiceError::PermissionDenied(message.into())
    }

    pub fn invalid_transition(message: impl Into<String>) -> Self {
        InvoiceError::InvalidTransition(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        InvoiceError::NotFound(message.into())
    }
}
