//! # Basket Tracking Test Suite
//!
//! Cross-crate tests that need more than one component wired together.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── engine_benchmarks.rs   # resolution, recompute, store queries
//! └── src/integration/
//!     ├── scenarios.rs           # workflow scenarios through the coordinator
//!     └── durability.rs          # file-backed adapters across restarts
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p bt-tests
//! cargo test -p bt-tests integration::durability
//! cargo bench -p bt-tests
//! ```

pub mod integration;
