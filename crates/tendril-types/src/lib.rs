//! # tendril-types
//!
//! Shared error types, scalar alias, and physical constants for the
//! Tendril cable-actuated soft-body simulation engine.
//!
//! This crate has zero domain logic — it defines the vocabulary
//! that all other Tendril crates share.

pub mod constants;
pub mod error;
pub mod scalar;

pub use error::{TendrilError, TendrilResult};
pub use scalar::Scalar;
