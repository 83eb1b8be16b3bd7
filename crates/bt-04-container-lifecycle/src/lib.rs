//! # Container Lifecycle State Machine (bt-04)
//!
//! Decides whether a workflow may act on a container and what status the
//! container ends up in.
//!
//! ## Transition table
//!
//! | Workflow | Required status | Result |
//! |----------|-----------------|--------|
//! | Production | any | IN_PRODUCTION |
//! | Receiving | IN_PRODUCTION | IN_STOCK |
//! | Inventory count | any (warehouse checked) | unchanged |
//! | Loading | IN_STOCK | LOADING |
//! | Shipping verification | LOADING, UNASSIGNED | SHIPPED |
//! | Clear | any | UNASSIGNED |
//! | Sampling | any | SAMPLING |
//!
//! ## Scan handling
//!
//! Validators never return booleans: every scan maps to one variant of
//! `ScanValidation` (or `ShippingScan` for verification) and callers match
//! exhaustively.
//!
//! Two guards sit in front of validation:
//! - `ScanDebouncer` drops repeat reads of one uid inside a short window.
//! - `InFlightGuard` serialises processing per uid while different uids
//!   proceed concurrently.

pub mod domain;
pub mod in_flight;

pub use domain::{
    transition, validate_inventory, validate_loading, validate_receiving, LifecycleError,
    ScanDebouncer, ScanValidation, ShippingScan, ShippingSession, Workflow,
};
pub use in_flight::InFlightGuard;
