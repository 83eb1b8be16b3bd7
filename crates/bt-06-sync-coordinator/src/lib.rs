//! # Sync Coordinator (bt-06)
//!
//! Orchestrates every basket workflow against three collaborators: the local
//! container store, the remote API and the outbox.
//!
//! ## Write path
//!
//! ```text
//! validate ──→ online? ──yes──→ remote call (time-bounded) ──ok──┐
//!                 │                     │ error / timeout        │
//!                 no                    ↓                        ↓
//!                 └──────────────→ outbox append ──────────→ local persist
//! ```
//!
//! Connectivity is sampled once, at the start of an operation. Any remote
//! failure, timeouts included, takes the same path as being offline, so the
//! caller sees `SyncPath::Queued` instead of an error. The local store is
//! written only after the remote call succeeded or the outbox append did, so
//! a failed append leaves no local trace.
//!
//! ## Workflows
//!
//! | Operation | Remote | Local effect |
//! |-----------|--------|--------------|
//! | `submit_production` | bulk update | create/update → IN_PRODUCTION |
//! | `scan_receiving` / `receive_batch` | bulk update | IN_PRODUCTION → IN_STOCK |
//! | `scan_inventory` | bulk update (adoption only) | confirm or adopt |
//! | `scan_loading` | none (staged) | IN_STOCK → LOADING, route progress |
//! | `submit_loading` | loading submit | none |
//! | `scan_shipping` | none (staged) | verification session |
//! | `submit_shipping_verification` | shipping verification | → SHIPPED, route VERIFIED |
//! | `transfer_containers` / `clear_containers` | bulk update | warehouse / reset |
//! | `mark_sampling` | sampling mark | → SAMPLING |
//! | `delete_container` | optional delete | record removed |

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::{MockRemoteApi, RemoteCall, StaticConnectivity};
pub use config::SyncConfig;
pub use domain::{
    BulkUpdateReport, DeleteScope, LoadingScanOutcome, ScanOutcome, ShippingReport,
    ShippingScanOutcome, SyncPath,
};
pub use error::{RemoteError, SyncError, SyncResult};
pub use ports::{
    Connectivity, LoadingSubmission, RemoteApi, SamplingRequest, ShippingSubmission,
    SubmittedItem,
};
pub use service::{SyncCoordinator, SyncDependencies};
