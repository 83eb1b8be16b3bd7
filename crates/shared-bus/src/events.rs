//! # Sync Events
//!
//! Defines all event types that flow through the shared bus.

use serde::{Deserialize, Serialize};
use shared_types::{ContainerStatus, RouteStatus};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncEvent {
    // =========================================================================
    // CONTAINERS
    // =========================================================================
    /// A container record was written to the local store.
    ContainerUpdated {
        uid: String,
        status: ContainerStatus,
        warehouse_id: Option<String>,
    },

    /// A container record was removed from the local store.
    ContainerDeleted { uid: String },

    // =========================================================================
    // OUTBOX
    // =========================================================================
    /// A deferred remote write was appended to the outbox.
    OperationQueued {
        operation_id: String,
        operation_type: String,
        target_key: String,
        /// Outbox size after the append.
        pending: usize,
    },

    /// The replay process acknowledged an outbox entry.
    OperationAcknowledged { operation_id: String, pending: usize },

    // =========================================================================
    // ROUTES
    // =========================================================================
    /// A route's completion state was recomputed.
    RouteProgressed {
        route_id: String,
        status: RouteStatus,
        full_baskets_completed: bool,
        loose_items_completed: bool,
    },

    // =========================================================================
    // SCANS
    // =========================================================================
    /// A scan failed validation.
    ScanRejected {
        uid: String,
        workflow: String,
        reason: String,
    },
}

impl SyncEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::ContainerUpdated { .. } | Self::ContainerDeleted { .. } => EventTopic::Containers,
            Self::OperationQueued { .. } | Self::OperationAcknowledged { .. } => EventTopic::Outbox,
            Self::RouteProgressed { .. } => EventTopic::Routes,
            Self::ScanRejected { .. } => EventTopic::Scans,
        }
    }

    /// The container uid or route id the event is about, if any.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::ContainerUpdated { uid, .. }
            | Self::ContainerDeleted { uid }
            | Self::ScanRejected { uid, .. } => Some(uid),
            Self::RouteProgressed { route_id, .. } => Some(route_id),
            Self::OperationQueued { target_key, .. } => Some(target_key),
            Self::OperationAcknowledged { .. } => None,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Container store mutations.
    Containers,
    /// Outbox appends and acknowledgements.
    Outbox,
    /// Route completion changes.
    Routes,
    /// Scan rejections.
    Scans,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Keys (uids / route ids) to include. Empty means all keys.
    pub keys: Vec<String>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            keys: Vec::new(),
        }
    }

    /// Create a filter for events about specific uids or route ids.
    #[must_use]
    pub fn keys(keys: Vec<String>) -> Self {
        Self {
            topics: Vec::new(),
            keys,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &SyncEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let key_match = self.keys.is_empty()
            || event
                .key()
                .is_some_and(|key| self.keys.iter().any(|k| k == key));

        topic_match && key_match
    }
}
