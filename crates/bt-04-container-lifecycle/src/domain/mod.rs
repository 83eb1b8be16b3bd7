//! Domain layer: pure rules, driven by caller-supplied time.

pub mod debounce;
pub mod errors;
pub mod shipping;
pub mod transitions;
pub mod validation;

pub use debounce::ScanDebouncer;
pub use errors::LifecycleError;
pub use shipping::{ShippingScan, ShippingSession};
pub use transitions::{transition, Workflow};
pub use validation::{validate_inventory, validate_loading, validate_receiving, ScanValidation};
