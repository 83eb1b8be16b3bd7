//! Store adapters.
//!
//! - `memory` - volatile maps for tests and ephemeral sessions
//! - `file` - JSON snapshot files written atomically via temp file + rename

pub mod file;
pub mod memory;

pub use file::{FileBackedContainerStore, FileBackedRouteStore};
pub use memory::{InMemoryContainerStore, InMemoryRouteStore};
