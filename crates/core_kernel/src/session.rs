//! Request/session context
//!
//! Every action receives an explicit context carrying the caller's role
//! and what the caller is currently doing. The form mode is a single
//! tagged union: create, edit, and reissue are mutually exclusive by
//! construction, so invalid flag combinations cannot be represented.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::identifiers::InvoiceId;

/// Role of the authenticated user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Billing clerk: creates and corrects invoices
    Legalizador,
    /// Audit role: reviews, returns, files, and deletes invoices
    Auditor,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Legalizador => write!(f, "legalizador"),
            Role::Auditor => write!(f, "auditor"),
        }
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legalizador" => Ok(Role::Legalizador),
            "auditor" => Ok(Role::Auditor),
            other => Err(CoreError::validation(format!("Unknown role: {}", other))),
        }
    }
}

/// What the caller is currently doing with the entry form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FormMode {
    /// Entering a brand-new invoice
    Create,
    /// Editing an existing invoice's descriptive fields
    Edit { invoice_id: InvoiceId },
    /// Re-issuing an overdue invoice under a new number
    Reissue { invoice_id: InvoiceId },
}

/// Context for one user action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Authenticated username
    pub username: String,
    /// Authenticated role
    pub role: Role,
    /// Current form mode
    pub mode: FormMode,
}

impl SessionContext {
    /// Creates a context in create mode
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
            mode: FormMode::Create,
        }
    }

    /// Switches the context to edit mode for the given invoice
    pub fn editing(mut self, invoice_id: InvoiceId) -> Self {
        self.mode = FormMode::Edit { invoice_id };
        self
    }

    /// Switches the context to reissue mode for the given invoice
    pub fn reissuing(mut self, invoice_id: InvoiceId) -> Self {
        self.mode = FormMode::Reissue { invoice_id };
        self
    }

    /// Returns true if the caller holds the audit role
    pub fn is_auditor(&self) -> bool {
        self.role == Role::Auditor
    }

    /// Returns true if the caller holds the billing-clerk role
    pub fn is_legalizador(&self) -> bool {
        self.role == Role::Legalizador
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        let role: Role = "auditor".parse().unwrap();
        assert_eq!(role, Role::Auditor);
        assert_eq!(role.to_string(), "auditor");
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        assert!("radicador".parse::<Role>().is_err());
    }

    #[test]
    fn test_modes_are_mutually_exclusive() {
        let id = InvoiceId::new();
        let ctx = SessionContext::new("ana", Role::Legalizador).editing(id);
        assert_eq!(ctx.mode, FormMode::Edit { invoice_id: id });

        let ctx = ctx.reissuing(id);
        assert_eq!(ctx.mode, FormMode::Reissue { invoice_id: id });
    }
}
