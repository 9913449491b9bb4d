//! Shared types used across the kernel crates.

pub mod types;

pub use types::AggregateId;
