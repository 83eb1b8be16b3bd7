//! # Shared Bus - Change Notification for the Sync Engine
//!
//! Local mutations (container writes, outbox appends, route progress) are
//! published here so observers can react without polling. The bus carries
//! notifications only; the stores remain the source of truth, so a reader
//! that misses events can always pull a fresh snapshot.
//!
//! ```text
//! ┌──────────────────┐   publish()   ┌──────────────┐  subscribe()  ┌──────────┐
//! │ Sync Coordinator │ ────────────→ │  Event Bus   │ ────────────→ │ Observer │
//! └──────────────────┘               └──────────────┘               └──────────┘
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, SyncEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
