//! Read-through cache for worklist queries
//!
//! Bulk list queries dominate read traffic, so a short-TTL cache sits
//! in front of them. The cache cannot observe row changes on its own:
//! callers must invoke [`WorklistCache::invalidate`] after every
//! successful mutation. Cached values are raw records, not projections,
//! because the projection depends on "today".

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use domain_invoicing::{InvoiceRecord, ListFilter};

/// Default entry lifetime
const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Time-boxed cache keyed by list filter
#[derive(Debug)]
pub struct WorklistCache {
    entries: RwLock<HashMap<ListFilter, (Instant, Vec<InvoiceRecord>)>>,
    ttl: Duration,
}

impl Default for WorklistCache {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }
}

impl WorklistCache {
    /// Creates a cache whose entries expire after `ttl`
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns the cached records for a filter, if fresh
    pub fn get(&self, filter: &ListFilter) -> Option<Vec<InvoiceRecord>> {
        let entries = self.entries.read().expect("cache lock poisoned");
        entries.get(filter).and_then(|(stored_at, records)| {
            (stored_at.elapsed() < self.ttl).then(|| records.clone())
        })
    }

    /// Stores the records for a filter
    pub fn put(&self, filter: ListFilter, records: Vec<InvoiceRecord>) {
        let mut entries = self.entries.write().expect("cache lock poisoned");
        entries.insert(filter, (Instant::now(), records));
    }

    /// Drops every entry; called after each successful mutation
    pub fn invalidate(&self) {
        let mut entries = self.entries.write().expect("cache lock poisoned");
        entries.clear();
    }
}
