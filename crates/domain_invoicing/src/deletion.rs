//! Two-phase deletion guard
//!
//! Deleting an invoice is irreversible, so it takes two steps: an
//! auditor first marks the row for deletion, then confirms. The mark
//! expires after a configurable window and is cleared by an explicit
//! cancel, so a stale confirmation can never fire.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use core_kernel::InvoiceId;

use crate::error::InvoiceError;

/// Default lifetime of a deletion mark
const DEFAULT_MARK_TTL_SECS: i64 = 300;

/// Tracks invoices marked for deletion awaiting confirmation
#[derive(Debug)]
pub struct PendingDeletions {
    marks: Mutex<HashMap<InvoiceId, DateTime<Utc>>>,
    ttl: Duration,
}

impl Default for PendingDeletions {
    fn default() -> Self {
        Self::with_ttl(Duration::seconds(DEFAULT_MARK_TTL_SECS))
    }
}

impl PendingDeletions {
    /// Creates a guard whose marks expire after `ttl`
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            marks: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Marks an invoice for deletion
    pub fn mark(&self, id: InvoiceId, now: DateTime<Utc>) {
        let mut marks = self.marks.lock().expect("deletion lock poisoned");
        marks.insert(id, now + self.ttl);
    }

    /// Clears the mark, if any
    pub fn cancel(&self, id: InvoiceId) {
        let mut marks = self.marks.lock().expect("deletion lock poisoned");
        marks.remove(&id);
    }

    /// Consumes the mark; errors when the invoice was never marked or
    /// the mark has expired
    pub fn take_confirmed(&self, id: InvoiceId, now: DateTime<Utc>) -> Result<(), InvoiceError> {
        let mut marks = self.marks.lock().expect("deletion lock poisoned");
        match marks.remove(&id) {
            Some(expires_at) if now <= expires_at => Ok(()),
            Some(_) => Err(InvoiceError::invalid_transition(format!(
                "Deletion mark for invoice {} has expired; mark it again",
                id
            ))),
            None => Err(InvoiceError::invalid_transition(format!(
                "Invoice {} is not marked for deletion",
                id
            ))),
        }
    }

    /// Returns true if the invoice currently holds an unexpired mark
    pub fn is_marked(&self, id: InvoiceId, now: DateTime<Utc>) -> bool {
        let marks = self.marks.lock().expect("deletion lock poisoned");
        marks.get(&id).is_some_and(|expires_at| now <= *expires_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_mark_then_confirm() {
        let guard = PendingDeletions::default();
        let id = InvoiceId::new();
        guard.mark(id, now());
        assert!(guard.is_marked(id, now()));
        guard.take_confirmed(id, now()).unwrap();
        // the mark is consumed
        assert!(!guard.is_marked(id, now()));
    }

    #[test]
    fn test_confirm_without_mark_fails() {
        let guard = PendingDeletions::default();
        let result = guard.take_confirmed(InvoiceId::new(), now());
        assert!(matches!(result, Err(InvoiceError::InvalidTransition(_))));
    }

    #[test]
    fn test_cancel_clears_mark() {
        let guard = PendingDeletions::default();
        let id = InvoiceId::new();
        guard.mark(id, now());
        guard.cancel(id);
        assert!(guard.take_confirmed(id, now()).is_err());
    }

    #[test]
    fn test_mark_expires() {
        let guard = PendingDeletions::with_ttl(Duration::seconds(60));
        let id = InvoiceId::new();
        guard.mark(id, now());
        let late = now() + Duration::seconds(61);
        assert!(!guard.is_marked(id, late));
        assert!(matches!(
            guard.take_confirmed(id, late),
            Err(InvoiceError::InvalidTransition(_))
        ));
    }
}
