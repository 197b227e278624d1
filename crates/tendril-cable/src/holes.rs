//! Hole state arrays.
//!
//! Holes are the discrete points where a cable threads through the
//! body, ordered along the cable's physical path. Position and
//! velocity are *derived* state — recomputed from node state through
//! the coupling every step — but are kept here so the loss layer can
//! observe hole trajectories without re-deriving them.

use glam::Vec3;
use tendril_types::{TendrilError, TendrilResult};

/// Ordered per-hole state for one cable (M rows of `Vec3`).
#[derive(Debug, Clone)]
pub struct Holes {
    /// Hole positions, ordered along the cable toward the tip.
    pub position: Vec<Vec3>,
    /// Hole velocities.
    pub velocity: Vec<Vec3>,
    /// Hole forces as computed by the tension model.
    pub force: Vec<Vec3>,
}

impl Holes {
    /// Creates hole state from rest positions, at rest.
    ///
    /// A cable needs at least two holes to carry tension.
    pub fn at_rest(position: Vec<Vec3>) -> TendrilResult<Self> {
        if position.len() < 2 {
            return Err(TendrilError::InvalidConfig(format!(
                "A cable needs at least 2 holes, got {}",
                position.len()
            )));
        }
        if position.iter().any(|p| !p.is_finite()) {
            return Err(TendrilError::InvalidConfig(
                "Non-finite hole rest position".into(),
            ));
        }
        let m = position.len();
        Ok(Self {
            position,
            velocity: vec![Vec3::ZERO; m],
            force: vec![Vec3::ZERO; m],
        })
    }

    /// Returns the hole count.
    #[inline]
    pub fn len(&self) -> usize {
        self.position.len()
    }

    /// Always false — construction requires at least two holes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    /// Zeroes the force array.
    pub fn clear_forces(&mut self) {
        self.force.fill(Vec3::ZERO);
    }
}
