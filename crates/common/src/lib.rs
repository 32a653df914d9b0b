//! Shared types used across the saga gateway crates.

pub mod types;

pub use types::ResourceId;
