//! Ports for the Sync Coordinator.
//!
//! The coordinator's own operations are its inbound API; the traits here are
//! the driven side.

pub mod outbound;

pub use outbound::{
    Connectivity, LoadingSubmission, RemoteApi, SamplingRequest, ShippingSubmission,
    SubmittedItem,
};
