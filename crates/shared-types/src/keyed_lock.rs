//! Per-key async serialisation.
//!
//! Work on the same key (a container uid, a route id) runs one at a time;
//! work on different keys proceeds concurrently. Entries are dropped once the
//! last holder releases them, so the map only grows with in-flight keys.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of per-key async mutexes.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    slots: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Held while the key is locked. Releases (and prunes the slot) on drop.
pub struct KeyGuard<'a> {
    owner: &'a KeyedLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `key` is free, then hold it.
    pub async fn lock(&self, key: &str) -> KeyGuard<'_> {
        let slot = {
            let mut slots = self.slots.lock();
            slots
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        let guard = slot.lock_owned().await;
        KeyGuard {
            owner: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    /// Hold `key` only if nobody else does.
    pub fn try_lock(&self, key: &str) -> Option<KeyGuard<'_>> {
        let slot = {
            let mut slots = self.slots.lock();
            slots
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        let guard = slot.try_lock_owned().ok()?;
        Some(KeyGuard {
            owner: self,
            key: key.to_string(),
            guard: Some(guard),
        })
    }

    /// Keys currently tracked (held or awaited).
    #[must_use]
    pub fn active_keys(&self) -> usize {
        self.slots.lock().len()
    }
}

impl KeyGuard<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut slots = self.owner.slots.lock();
        // Only the map and nobody else references the slot: safe to prune.
        if let Some(slot) = slots.get(&self.key) {
            if Arc::strong_count(slot) == 1 {
                slots.remove(&self.key);
            }
        }
    }
}
