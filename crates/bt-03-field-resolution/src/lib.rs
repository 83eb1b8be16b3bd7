//! # Field Resolution Engine (bt-03)
//!
//! Computes the final state of a container from a bulk update.
//!
//! Each field is resolved independently, highest priority first:
//!
//! ```text
//! item override  >  common (batch) default  >  existing persisted value
//! ```
//!
//! A per-update-type specialization then runs:
//!
//! | Update | Specialization |
//! |--------|----------------|
//! | `PRODUCTION` | product, batch and dates taken from the common payload |
//! | `CLEAR` | UNASSIGNED, quantity 0, product/batch/warehouse/dates cleared |
//! | `RECEIVING` / `TRANSFER` | none |
//!
//! A status string that does not parse falls back to the container's current
//! status and is reported as a `ResolutionWarning`; it never fails the update.
//!
//! The crate is pure: no I/O, no clock. Callers pass `now`.

pub mod domain;

pub use domain::{
    resolve_batch, resolve_update, BasketUpdate, BulkUpdateRequest, CommonData, MissingPolicy,
    Resolution, ResolutionError, ResolutionWarning, ResolvedBatch, StatusSource, UpdateType,
};
