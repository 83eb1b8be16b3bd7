//! # Shared Types Crate
//!
//! Domain entities and small utilities shared by every basket-tracking
//! component.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Container` and `LoadingRoute` are defined once here.
//! - **Stable identity**: a container's `uid` is the only cross-session key.
//! - **Deterministic time**: components read time through `TimeSource`.

pub mod entities;
pub mod errors;
pub mod keyed_lock;
pub mod time;

pub use entities::*;
pub use errors::*;
pub use keyed_lock::{KeyGuard, KeyedLocks};
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource, Timestamp};
