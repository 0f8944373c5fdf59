//! Bounded query history feeding suggestions
//!
//! Entries are keyed by the lowercased raw query. When the history is full,
//! recording a new query evicts the least recently used one.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

pub const DEFAULT_HISTORY_CAPACITY: usize = 500;

/// How often a query was searched and when it was last used
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub query: String,
    pub frequency: u64,
    pub last_used_at: DateTime<Utc>,
    pub last_result_count: usize,
    /// Monotonic use counter, orders entries by recency
    #[serde(skip)]
    last_tick: u64,
}

#[derive(Debug, Clone)]
pub struct SearchHistory {
    entries: HashMap<String, HistoryEntry>,
    capacity: usize,
    clock: u64,
}

impl Default for SearchHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl SearchHistory {
    /// History holding at most `capacity` distinct queries (at least one)
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            clock: 0,
        }
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&HistoryEntry> {
        self.entries.get(key)
    }

    /// Count one more use of `key`
    pub fn record(&mut self, key: &str, result_count: usize) -> &HistoryEntry {
        self.record_at(key, result_count, Utc::now())
    }

    pub fn record_at(&mut self, key: &str, result_count: usize, at: DateTime<Utc>) -> &HistoryEntry {
        self.clock += 1;
        let tick = self.clock;

        if !self.entries.contains_key(key) && self.entries.len() >= self.capacity {
            self.evict_least_recent();
        }

        let entry = self
            .entries
            .entry(key.to_string())
            .and_modify(|e| e.frequency += 1)
            .or_insert_with(|| HistoryEntry {
                query: key.to_string(),
                frequency: 1,
                last_used_at: at,
                last_result_count: result_count,
                last_tick: tick,
            });
        entry.last_used_at = at;
        entry.last_result_count = result_count;
        entry.last_tick = tick;
        entry
    }

    /// Entries whose key starts with the lowercased prefix, most frequent first
    ///
    /// Equal frequencies put the most recently used query first.
    pub fn suggest(&self, prefix: &str, limit: usize) -> Vec<&HistoryEntry> {
        let prefix = prefix.to_lowercase();
        let mut matches: Vec<&HistoryEntry> = self
            .entries
            .values()
            .filter(|e| e.query.starts_with(&prefix))
            .collect();

        matches.sort_by(|a, b| {
            b.frequency
                .cmp(&a.frequency)
                .then_with(|| b.last_tick.cmp(&a.last_tick))
        });
        matches.truncate(limit);
        matches
    }

    fn evict_least_recent(&mut self) {
        let oldest = self
            .entries
            .values()
            .min_by_key(|e| e.last_tick)
            .map(|e| e.query.clone());

        if let Some(key) = oldest {
            warn!("Search history full ({}), evicting '{}'", self.capacity, key);
            self.entries.remove(&key);
        }
    }
}
