//! Error types for the Tendril engine.
//!
//! All crates return `TendrilResult<T>` from fallible operations.
//! There are no retries at any layer: a simulation step is not
//! idempotent, so failures abort the current rollout.

use thiserror::Error;

/// Unified error type for the Tendril engine.
#[derive(Debug, Error)]
pub enum TendrilError {
    /// Mesh data is malformed or inconsistent.
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// Configuration value is invalid (rejected at construction, not at use).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A hole could not be matched to any containing tetrahedron,
    /// or the resulting coupling operator is malformed.
    #[error("Invalid coupling: {0}")]
    InvalidCoupling(String),

    /// An array arrived at a component boundary with the wrong shape.
    #[error("Shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// NaN or infinity appeared in a state array. Surfaced as a hard
    /// failure rather than clipped — it indicates an upstream modeling
    /// or geometry problem.
    #[error("Non-finite value in {context} at global step {step}")]
    NonFinite { context: String, step: u64 },

    /// The time-integration backend failed.
    #[error("Integrator error: {0}")]
    Integrator(String),

    /// Linear-algebra failure (e.g., SVD did not converge).
    #[error("Numerical error: {0}")]
    Numerical(String),
}

/// Convenience alias for `Result<T, TendrilError>`.
pub type TendrilResult<T> = Result<T, TendrilError>;
