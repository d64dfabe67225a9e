//! FIFO store of recorded exchanges, grouped by correlation key

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::matcher::Matcher;
use crate::{Result, TapedeckError};

use super::RecordEntry;

/// Mapping from correlation key to an ordered queue of recorded entries.
///
/// Entries for a key are handed out in the exact order they were recorded
/// and consumed exactly once; an exhausted or unknown key is a hard
/// playback divergence. Per-key mutations are serialized by the map's
/// sharded entry locks, so concurrent dequeues on one key never hand the
/// same entry to two callers.
pub struct RecordStore {
    matcher: Arc<dyn Matcher>,
    queues: DashMap<String, VecDeque<RecordEntry>>,
}

impl RecordStore {
    /// Create an empty store keyed by `matcher`
    #[must_use]
    pub fn new(matcher: Arc<dyn Matcher>) -> Self {
        Self {
            matcher,
            queues: DashMap::new(),
        }
    }

    /// Append an entry to the queue for its request's correlation key
    pub fn enqueue(&self, entry: RecordEntry) {
        let key = self.matcher.key(&entry.request());
        debug!("Enqueue entry for key '{}'", key);
        self.queues.entry(key).or_default().push_back(entry);
    }

    /// Remove and return the head of the queue for `key`
    ///
    /// # Errors
    ///
    /// Returns `NoMatchingRecord` when the key is absent or exhausted
    pub fn dequeue(&self, key: &str) -> Result<RecordEntry> {
        self.queues
            .get_mut(key)
            .and_then(|mut queue| queue.pop_front())
            .ok_or_else(|| TapedeckError::NoMatchingRecord(key.to_string()))
    }

    /// Bulk-populate queues from a flat ordered sequence, grouping by key
    /// while preserving relative order within each key
    pub fn load_all(&self, entries: Vec<RecordEntry>) {
        for entry in entries {
            self.enqueue(entry);
        }
    }

    /// Total number of entries queued across all keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.queues.iter().map(|queue| queue.len()).sum()
    }

    /// Check whether no entries remain
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
