//! Result types returned by coordinator operations.

pub mod outcomes;

pub use outcomes::{
    BulkUpdateReport, DeleteScope, LoadingScanOutcome, ScanOutcome, ShippingReport,
    ShippingScanOutcome, SyncPath,
};
