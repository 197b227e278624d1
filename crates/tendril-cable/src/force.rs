//! Cable tension/damping force model with its analytic adjoint.
//!
//! Tangents point toward the tip: t[i] = p[i+1] − p[i]. Segment
//! tension f[i] = pull · k · t[i]; per-hole damping g[i] = c · v[i].
//! The tridiagonal assembly
//!
//! ```text
//! force[0]   = −f[0] − g[0]
//! force[i]   =  f[i−1] − f[i] − g[i]      (0 < i < M−1)
//! force[M−1] =  f[M−2] − g[M−1]
//! ```
//!
//! makes tension internal and self-cancelling: summed over one cable
//! the tension contributions are exactly zero, and only the coupling
//! to the mesh (different holes attaching to different nodes) produces
//! net shape change.
//!
//! The pull ratio arrives *raw* from the schedule and is clamped to
//! non-negative here, at the point of consumption — a cable can pull,
//! never push. The clamp is a physical constraint, not an error.

use glam::Vec3;
use tendril_types::{Scalar, TendrilError, TendrilResult};

/// Gradients of a scalar loss w.r.t. the force-model inputs.
#[derive(Debug, Clone)]
pub struct CableForceGrads {
    /// Gradient w.r.t. hole positions.
    pub position: Vec<Vec3>,
    /// Gradient w.r.t. hole velocities.
    pub velocity: Vec<Vec3>,
    /// Gradient w.r.t. the raw (unclamped) schedule value.
    pub pull_ratio: Scalar,
}

fn check_lengths(position: &[Vec3], velocity: &[Vec3]) -> TendrilResult<()> {
    if position.len() < 2 {
        return Err(TendrilError::InvalidConfig(format!(
            "Cable force model needs at least 2 holes, got {}",
            position.len()
        )));
    }
    if velocity.len() != position.len() {
        return Err(TendrilError::ShapeMismatch {
            context: "hole velocity".into(),
            expected: position.len(),
            actual: velocity.len(),
        });
    }
    Ok(())
}

/// Computes per-hole forces for one cable.
///
/// `raw_pull` is the schedule value before clamping.
pub fn cable_force(
    position: &[Vec3],
    velocity: &[Vec3],
    raw_pull: Scalar,
    stiffness: Scalar,
    damping: Scalar,
) -> TendrilResult<Vec<Vec3>> {
    check_lengths(position, velocity)?;

    let m = position.len();
    let pull = raw_pull.max(0.0);

    // f[i] = pull · k · (p[i+1] − p[i]) for the M−1 segments.
    let tension: Vec<Vec3> = (0..m - 1)
        .map(|i| (position[i + 1] - position[i]) * (pull * stiffness))
        .collect();

    let mut force = vec![Vec3::ZERO; m];
    force[0] = -tension[0] - velocity[0] * damping;
    for i in 1..m - 1 {
        force[i] = tension[i - 1] - tension[i] - velocity[i] * damping;
    }
    force[m - 1] = tension[m - 2] - velocity[m - 1] * damping;
    Ok(force)
}

/// Adjoint of [`cable_force`].
///
/// Given the gradient of the loss w.r.t. the per-hole forces, returns
/// gradients w.r.t. hole positions, hole velocities, and the raw
/// schedule value. The clamp passes gradient through when the raw
/// value is ≥ 0 and blocks it when negative.
///
/// Hole velocities enter the forward pass only through the linear
/// damping term, so the backward pass needs positions and the raw
/// pull, not the velocities themselves.
pub fn cable_force_backward(
    position: &[Vec3],
    raw_pull: Scalar,
    stiffness: Scalar,
    damping: Scalar,
    grad_force: &[Vec3],
) -> TendrilResult<CableForceGrads> {
    if position.len() < 2 {
        return Err(TendrilError::InvalidConfig(format!(
            "Cable force model needs at least 2 holes, got {}",
            position.len()
        )));
    }
    if grad_force.len() != position.len() {
        return Err(TendrilError::ShapeMismatch {
            context: "cable force gradient".into(),
            expected: position.len(),
            actual: grad_force.len(),
        });
    }

    let m = position.len();
    let pull = raw_pull.max(0.0);

    let mut grad_position = vec![Vec3::ZERO; m];
    let mut grad_velocity = vec![Vec3::ZERO; m];
    let mut grad_pull = 0.0f32;

    // g[i] = c · v[i] appears as −g[i] in every force[i].
    for i in 0..m {
        grad_velocity[i] = -grad_force[i] * damping;
    }

    // f[i] appears as −f[i] in force[i] and +f[i] in force[i+1]:
    // df[i] = grad_force[i+1] − grad_force[i].
    for i in 0..m - 1 {
        let d_tension = grad_force[i + 1] - grad_force[i];
        let tangent = position[i + 1] - position[i];

        // f[i] = pull · k · t[i]
        grad_pull += stiffness * tangent.dot(d_tension);
        let d_tangent = d_tension * (pull * stiffness);

        // t[i] = p[i+1] − p[i]
        grad_position[i + 1] += d_tangent;
        grad_position[i] -= d_tangent;
    }

    // Clamp subgradient: inclusive at the boundary.
    let grad_raw = if raw_pull >= 0.0 { grad_pull } else { 0.0 };

    Ok(CableForceGrads {
        position: grad_position,
        velocity: grad_velocity,
        pull_ratio: grad_raw,
    })
}
