//! Per-uid in-flight guard.

use shared_types::{KeyGuard, KeyedLocks};
use std::collections::BTreeSet;

/// Serialises processing of scans for the same uid.
///
/// A second scan of a uid waits for the first to finish; scans of different
/// uids do not block each other.
#[derive(Debug, Default)]
pub struct InFlightGuard {
    locks: KeyedLocks,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the uid to be free, then hold it until the guard drops.
    pub async fn acquire(&self, uid: &str) -> KeyGuard<'_> {
        self.locks.lock(uid).await
    }

    /// Hold every uid of a batch until the guards drop.
    ///
    /// Uids are taken once each, in sorted order, so two batches sharing uids
    /// cannot deadlock each other.
    pub async fn acquire_all<I, S>(&self, uids: I) -> Vec<KeyGuard<'_>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ordered: BTreeSet<String> = uids
            .into_iter()
            .map(|uid| uid.as_ref().to_string())
            .collect();
        let mut held = Vec::with_capacity(ordered.len());
        for uid in &ordered {
            held.push(self.locks.lock(uid).await);
        }
        held
    }

    /// Hold the uid only if no scan of it is in flight.
    pub fn try_acquire(&self, uid: &str) -> Option<KeyGuard<'_>> {
        self.locks.try_lock(uid)
    }

    pub fn in_flight(&self) -> usize {
        self.locks.active_keys()
    }
}
