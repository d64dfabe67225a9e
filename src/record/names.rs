//! Per-test-name queues of generated synthetic resource names

use std::collections::{BTreeMap, VecDeque};

use dashmap::DashMap;
use rand::Rng;
use tracing::debug;

use crate::{Result, TapedeckError};

use super::NAME_SUFFIX_DIGITS;

/// Queues of previously generated asset names, keyed by logical test name.
///
/// During a recording run every generated name is appended here so the
/// next playback run hands out the same names in the same order.
#[derive(Default)]
pub struct AssetNameRegistry {
    queues: DashMap<String, VecDeque<String>>,
}

impl AssetNameRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `name` to the queue for `test_name`
    pub fn enqueue(&self, test_name: &str, name: String) {
        self.queues
            .entry(test_name.to_string())
            .or_default()
            .push_back(name);
    }

    /// Remove and return the next recorded name for `test_name`
    ///
    /// # Errors
    ///
    /// Returns `NoRecordedName` when the test name is unknown or its
    /// queue is exhausted
    pub fn dequeue(&self, test_name: &str) -> Result<String> {
        self.queues
            .get_mut(test_name)
            .and_then(|mut queue| queue.pop_front())
            .ok_or_else(|| TapedeckError::NoRecordedName(test_name.to_string()))
    }

    /// Generate `prefix + random digits`, unique within `test_name`'s
    /// queue, and append it in the same critical section.
    ///
    /// The draw and the append happen under one entry lock so concurrent
    /// callers can never be handed the same candidate.
    pub fn generate_unique(&self, test_name: &str, prefix: &str) -> String {
        let mut rng = rand::thread_rng();
        let mut queue = self.queues.entry(test_name.to_string()).or_default();

        loop {
            let suffix: u32 = rng.gen_range(0..10u32.pow(NAME_SUFFIX_DIGITS));
            let candidate = format!(
                "{prefix}{suffix:0width$}",
                width = NAME_SUFFIX_DIGITS as usize
            );

            if !queue.contains(&candidate) {
                debug!("Generated asset name '{}' for test '{}'", candidate, test_name);
                queue.push_back(candidate.clone());
                return candidate;
            }
        }
    }

    /// Snapshot all queues in deterministic order, for persistence
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Vec<String>> {
        self.queues
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().iter().cloned().collect()))
            .collect()
    }

    /// Bulk-populate queues from persisted contents, extending any
    /// existing queue in order
    pub fn load_all(&self, names: BTreeMap<String, Vec<String>>) {
        for (test_name, queue) in names {
            self.queues
                .entry(test_name)
                .or_default()
                .extend(queue);
        }
    }

    /// Total number of queued names across all test names
    #[must_use]
    pub fn len(&self) -> usize {
        self.queues.iter().map(|queue| queue.len()).sum()
    }

    /// Check whether no names are queued
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
