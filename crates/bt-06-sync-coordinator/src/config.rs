//! Coordinator configuration.

use std::env;
use std::time::Duration;

/// Runtime knobs for the sync coordinator.
///
/// Built once at startup and passed in; nothing reads configuration from
/// global state afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Upper bound on any single remote call. Expiry counts as a failure.
    pub remote_timeout: Duration,
    /// Repeat reads of one uid inside this window are dropped.
    pub scan_debounce: Duration,
    /// How long debounce entries are retained before GC.
    pub debounce_retention: Duration,
    /// Actor recorded when a call does not name one.
    pub default_actor: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            remote_timeout: Duration::from_secs(10),
            scan_debounce: Duration::from_millis(300),
            debounce_retention: Duration::from_secs(60),
            default_actor: None,
        }
    }
}

impl SyncConfig {
    /// Read overrides from the environment.
    ///
    /// - `BT_REMOTE_TIMEOUT_MS` (default: 10000)
    /// - `BT_SCAN_DEBOUNCE_MS` (default: 300)
    /// - `BT_DEBOUNCE_RETENTION_MS` (default: 60000)
    /// - `BT_DEFAULT_ACTOR` (default: none)
    ///
    /// Unparseable values keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let millis = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(default)
        };

        Self {
            remote_timeout: millis("BT_REMOTE_TIMEOUT_MS", defaults.remote_timeout),
            scan_debounce: millis("BT_SCAN_DEBOUNCE_MS", defaults.scan_debounce),
            debounce_retention: millis("BT_DEBOUNCE_RETENTION_MS", defaults.debounce_retention),
            default_actor: lookup("BT_DEFAULT_ACTOR").filter(|v| !v.trim().is_empty()),
        }
    }

    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    pub fn with_scan_debounce(mut self, window: Duration) -> Self {
        self.scan_debounce = window;
        self
    }

    pub fn with_debounce_retention(mut self, retention: Duration) -> Self {
        self.debounce_retention = retention;
        self
    }

    pub fn with_default_actor(mut self, actor: impl Into<String>) -> Self {
        self.default_actor = Some(actor.into());
        self
    }
}
