//! Call memoizer: one fetch per read key, cached for the session.

use crate::datasource::DataSourceError;
use crate::domain::{RawValue, ReadKey};
use std::collections::HashMap;

/// State of a memoized read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEntry {
    Pending,
    Resolved(RawValue),
    Failed(DataSourceError),
}

impl ReadEntry {
    pub fn is_pending(&self) -> bool {
        matches!(self, ReadEntry::Pending)
    }

    pub fn resolved(&self) -> Option<&RawValue> {
        match self {
            ReadEntry::Resolved(value) => Some(value),
            _ => None,
        }
    }
}

/// Deduplicates contract reads by structural key.
///
/// The first `read` of a key records it as pending and queues it for issuance; the driver
/// collects queued keys with [`CallMemoizer::take_issued`]. Entries leave `Pending` exactly
/// once and are never evicted.
#[derive(Debug, Default)]
pub struct CallMemoizer {
    entries: HashMap<ReadKey, ReadEntry>,
    issued: Vec<ReadKey>,
}

impl CallMemoizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `key`, queueing a fetch on first sight.
    pub fn read(&mut self, key: &ReadKey) -> &ReadEntry {
        if !self.entries.contains_key(key) {
            self.issued.push(key.clone());
            self.entries.insert(key.clone(), ReadEntry::Pending);
        }
        &self.entries[key]
    }

    pub fn get(&self, key: &ReadKey) -> Option<&ReadEntry> {
        self.entries.get(key)
    }

    /// Record the outcome of a fetch.
    ///
    /// Returns false when the key was never requested or has already completed.
    pub fn complete(&mut self, key: &ReadKey, outcome: Result<RawValue, DataSourceError>) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) if entry.is_pending() => {
                *entry = match outcome {
                    Ok(value) => ReadEntry::Resolved(value),
                    Err(err) => ReadEntry::Failed(err),
                };
                true
            }
            _ => false,
        }
    }

    /// Drain keys queued since the last call.
    pub fn take_issued(&mut self) -> Vec<ReadKey> {
        std::mem::take(&mut self.issued)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn failed_keys(&self) -> Vec<ReadKey> {
        let mut keys: Vec<ReadKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| matches!(entry, ReadEntry::Failed(_)))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }
}
