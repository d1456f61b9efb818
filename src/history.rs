//! Search-history collaborator.
//!
//! The engine records non-empty searches into a [`HistoryStore`] when one is
//! attached, and draws history/popular suggestions back out of it. The store
//! owns its persistence format; [`MemoryHistory`] is the bundled in-memory
//! implementation.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::query::request::Filters;

/// One recorded search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The raw query text.
    pub query: String,
    /// Search kind name (`keyword`).
    pub kind: String,
    /// Number of results returned.
    pub result_count: usize,
    /// Execution time of the search.
    pub execution_time_ms: f64,
    /// Structured filters that were applied.
    pub filters: Filters,
    /// When the search ran.
    pub timestamp: DateTime<Utc>,
}

/// External key-value persistence for search history.
pub trait HistoryStore: Send + Sync {
    /// Record one search.
    fn record(&self, entry: HistoryEntry);

    /// The most recent entries, newest first, bounded by `count`.
    fn recent(&self, count: usize) -> Vec<HistoryEntry>;

    /// Query texts ranked by frequency, most frequent first.
    fn popular(&self, count: usize) -> Vec<(String, usize)>;

    /// Drop all recorded history.
    fn clear(&self);
}

/// In-memory history store bounded to a fixed number of entries.
pub struct MemoryHistory {
    entries: Mutex<Vec<HistoryEntry>>,
    capacity: usize,
}

impl MemoryHistory {
    /// Create a store keeping at most `capacity` entries (minimum 1);
    /// the oldest entry is dropped when full.
    pub fn new(capacity: usize) -> Self {
        MemoryHistory {
            entries: Mutex::new(Vec::new()),
            capacity: capacity.max(1),
        }
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl HistoryStore for MemoryHistory {
    fn record(&self, entry: HistoryEntry) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.remove(0);
        }
        entries.push(entry);
    }

    fn recent(&self, count: usize) -> Vec<HistoryEntry> {
        let entries = self.entries.lock();
        entries.iter().rev().take(count).cloned().collect()
    }

    fn popular(&self, count: usize) -> Vec<(String, usize)> {
        let entries = self.entries.lock();
        let mut counts: ahash::AHashMap<String, usize> = ahash::AHashMap::new();
        for entry in entries.iter() {
            *counts.entry(entry.query.clone()).or_insert(0) += 1;
        }
        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(count);
        ranked
    }

    fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(query: &str) -> HistoryEntry {
        HistoryEntry {
            query: query.to_string(),
            kind: "keyword".to_string(),
            result_count: 1,
            execution_time_ms: 0.1,
            filters: Filters::default(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_recent_newest_first() {
        let store = MemoryHistory::new(10);
        store.record(entry("react"));
        store.record(entry("vue"));
        let recent = store.recent(5);
        assert_eq!(recent[0].query, "vue");
        assert_eq!(recent[1].query, "react");
    }

    #[test]
    fn test_popular_frequency_ranked() {
        let store = MemoryHistory::new(10);
        store.record(entry("react"));
        store.record(entry("vue"));
        store.record(entry("react"));
        let popular = store.popular(2);
        assert_eq!(popular[0], ("react".to_string(), 2));
        assert_eq!(popular[1], ("vue".to_string(), 1));
    }

    #[test]
    fn test_capacity_and_clear() {
        let store = MemoryHistory::new(2);
        store.record(entry("a"));
        store.record(entry("b"));
        store.record(entry("c"));
        assert_eq!(store.recent(10).len(), 2);
        assert_eq!(store.recent(10)[0].query, "c");
        store.clear();
        assert!(store.recent(10).is_empty());
    }
}
