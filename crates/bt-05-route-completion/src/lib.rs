//! # Route Completion Aggregator (bt-05)
//!
//! Rolls per-item scan progress up into route status.
//!
//! ## Rules
//!
//! ```text
//! item.full  = expected_full == 0  || full_scanned >= expected_full || confirmed
//! item.loose = expected_loose == 0 || loose_scanned == expected_loose
//! route.full  = AND(item.full)
//! route.loose = AND(item.loose)
//! status = COMPLETED    if route.full && route.loose
//!        | IN_PROGRESS  if any item has activity
//!        | PENDING      otherwise
//! ```
//!
//! `VERIFIED` is set only by `mark_verified` (successful shipping
//! verification) and survives recomputation; only `reset` clears it.
//!
//! `recompute` reads nothing but the counters, so applying it twice yields
//! identical state.
//!
//! `RouteCompletionService` performs each read-compute-write on a route as
//! one unit, serialised per route id.

pub mod domain;
pub mod error;
pub mod service;

pub use domain::{
    confirm_full_baskets, mark_verified, merge_remote, record_full_basket, record_loose_items,
    recompute, reset,
};
pub use error::{CompletionError, CompletionResult};
pub use service::{CompletionOutcome, RouteCompletionService};
