//! The cable: holes + schedule + physical constants.

use tendril_types::constants::{DEFAULT_CABLE_DAMPING, DEFAULT_CABLE_STIFFNESS};
use tendril_types::{Scalar, TendrilError, TendrilResult};

use crate::holes::Holes;
use crate::pull_ratio::PullRatio;

/// One physical cable threaded through a deformable mesh.
///
/// Owns its hole state and its pull-ratio schedule. The coupling to
/// the mesh lives separately ([`crate::Coupling`]) because it is
/// derived from rest-configuration geometry and shared with the
/// simulation pipeline.
#[derive(Debug)]
pub struct Cable {
    /// Ordered hole state along the cable's path.
    pub holes: Holes,
    /// The tension-control schedule being optimized.
    pub pull_ratio: Box<dyn PullRatio>,
    /// Tension stiffness k.
    pub stiffness: Scalar,
    /// Velocity damping coefficient c.
    pub damping: Scalar,
}

impl Cable {
    /// Creates a cable with explicit physical constants.
    pub fn new(
        holes: Holes,
        pull_ratio: Box<dyn PullRatio>,
        stiffness: Scalar,
        damping: Scalar,
    ) -> TendrilResult<Self> {
        if stiffness < 0.0 || !stiffness.is_finite() {
            return Err(TendrilError::InvalidConfig(format!(
                "Cable stiffness must be non-negative and finite, got {stiffness}"
            )));
        }
        if damping < 0.0 || !damping.is_finite() {
            return Err(TendrilError::InvalidConfig(format!(
                "Cable damping must be non-negative and finite, got {damping}"
            )));
        }
        Ok(Self {
            holes,
            pull_ratio,
            stiffness,
            damping,
        })
    }

    /// Creates a cable with the default stiffness and damping.
    pub fn with_defaults(holes: Holes, pull_ratio: Box<dyn PullRatio>) -> TendrilResult<Self> {
        Self::new(
            holes,
            pull_ratio,
            DEFAULT_CABLE_STIFFNESS,
            DEFAULT_CABLE_DAMPING,
        )
    }

    /// Number of holes on this cable.
    #[inline]
    pub fn num_holes(&self) -> usize {
        self.holes.len()
    }
}
