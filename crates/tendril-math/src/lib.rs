//! # tendril-math
//!
//! Geometry and linear-algebra primitives for the Tendril engine.
//!
//! Provides:
//! - Re-exports of `glam` types (`Vec3`, `Mat3`, etc.)
//! - Tetrahedron geometry: signed distances, containment test,
//!   barycentric coordinates
//! - Dense Moore-Penrose pseudo-inversion (SVD-based)
//! - Dense matrix × `Vec3`-array products for the coupling operators

pub mod ops;
pub mod pinv;
pub mod tetra;

// Re-export glam types as the canonical math types for Tendril.
pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

// The dense matrix type used for the coupling operators.
pub use nalgebra::DMatrix;
