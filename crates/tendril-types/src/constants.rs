//! Physical constants and simulation defaults.

/// Gravitational acceleration (m/s²).
pub const GRAVITY: f32 = 9.8;

/// Default simulation timestep (seconds).
pub const DEFAULT_DT: f32 = 1.0 / 1800.0;

/// Default cable stiffness (N per unit tangent length per unit pull ratio).
pub const DEFAULT_CABLE_STIFFNESS: f32 = 100.0;

/// Default cable damping coefficient.
pub const DEFAULT_CABLE_DAMPING: f32 = 0.01;

/// Epsilon for floating-point comparisons.
pub const EPSILON: f32 = 1.0e-7;

/// Tolerance for "evenly divides" checks on durations and key-timepoint
/// spacings. Binary rounding means 0.6 / 0.3 is not exactly 2.0.
pub const DIVISIBILITY_TOLERANCE: f64 = 1.0e-6;

/// Singular-value cutoff for the coupling pseudo-inverse.
pub const PINV_TOLERANCE: f64 = 1.0e-10;

/// Tolerance for the gather-row sum-to-one invariant.
pub const BARYCENTRIC_SUM_TOLERANCE: f32 = 1.0e-5;
