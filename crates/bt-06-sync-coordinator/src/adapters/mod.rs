//! Adapters for the outbound ports.
//!
//! The real HTTP client lives outside this workspace; these are the
//! in-process implementations used by tests and offline tooling.

pub mod connectivity;
pub mod mock_remote;

pub use connectivity::StaticConnectivity;
pub use mock_remote::{MockRemoteApi, RemoteCall};
