//! Scalar type alias for the simulation.
//!
//! Using `f32` to match the accelerator precision the original pipeline
//! ran at. This alias makes it easy to experiment with `f64` if needed.

/// The floating-point type used throughout the simulation.
///
/// Set to `f32`. Linear-algebra routines that need extra headroom
/// (pseudo-inversion) promote to `f64` internally and convert back
/// at their boundary.
pub type Scalar = f32;
