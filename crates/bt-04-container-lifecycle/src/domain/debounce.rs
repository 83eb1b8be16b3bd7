//! # Scan Debouncer
//!
//! A single physical read often reaches the engine several times within a
//! few milliseconds. Repeats of the same uid inside the debounce window are
//! suppressed so they are counted once.
//!
//! - A uid is accepted if it was never seen or last seen `>= window` ago.
//! - Suppressed repeats do not extend the window.
//! - Entries older than the retention period are garbage-collected
//!   periodically, bounding memory to the recent scan set.

use parking_lot::Mutex;
use shared_types::Timestamp;
use std::collections::HashMap;
use std::time::Duration;

struct DebounceState {
    /// uid -> time of last accepted scan.
    last_seen: HashMap<String, Timestamp>,
    last_gc: Timestamp,
}

pub struct ScanDebouncer {
    state: Mutex<DebounceState>,
    window_ms: u64,
    retention_ms: u64,
}

impl ScanDebouncer {
    pub const DEFAULT_WINDOW: Duration = Duration::from_millis(300);
    pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60);

    pub fn new(window: Duration, retention: Duration) -> Self {
        let window_ms = window.as_millis() as u64;
        Self {
            state: Mutex::new(DebounceState {
                last_seen: HashMap::new(),
                last_gc: 0,
            }),
            window_ms,
            retention_ms: (retention.as_millis() as u64).max(window_ms),
        }
    }

    /// Returns `true` if the scan should be processed, and records it.
    pub fn accept(&self, uid: &str, now: Timestamp) -> bool {
        let mut state = self.state.lock();

        if now.saturating_sub(state.last_gc) >= self.retention_ms {
            let cutoff = now.saturating_sub(self.retention_ms);
            state.last_seen.retain(|_, seen| *seen >= cutoff);
            state.last_gc = now;
        }

        match state.last_seen.get(uid) {
            Some(&seen) if now.saturating_sub(seen) < self.window_ms => false,
            _ => {
                state.last_seen.insert(uid.to_string(), now);
                true
            }
        }
    }

    /// Forget a uid, e.g. after its processing failed and a retry is wanted.
    pub fn forget(&self, uid: &str) {
        self.state.lock().last_seen.remove(uid);
    }

    pub fn tracked(&self) -> usize {
        self.state.lock().last_seen.len()
    }
}

impl Default for ScanDebouncer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW, Self::DEFAULT_RETENTION)
    }
}
