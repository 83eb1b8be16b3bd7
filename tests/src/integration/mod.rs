//! # Cross-Crate Scenarios
//!
//! - `scenarios` - workflow scenarios driven through the coordinator
//! - `durability` - file-backed store and outbox across restarts

pub mod durability;
pub mod scenarios;
