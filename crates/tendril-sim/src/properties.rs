//! Simulation timing configuration.
//!
//! All divisibility and ordering invariants are checked at
//! construction, never at use: a rollout can assume its segment grid
//! is exact.

use serde::{Deserialize, Serialize};
use tendril_types::constants::{DEFAULT_DT, DIVISIBILITY_TOLERANCE};
use tendril_types::{Scalar, TendrilError, TendrilResult};

/// Timing parameters of one trajectory.
///
/// `duration` splits into `num_segments` checkpointed segments of
/// `segment_duration`, each `steps_per_segment` fine steps of `dt`.
/// `key_timepoints`, when present, are the support points for
/// time-variable pull-ratio schedules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawSimulationProperties")]
pub struct SimulationProperties {
    duration: Scalar,
    segment_duration: Scalar,
    dt: Scalar,
    key_timepoints: Option<Vec<Scalar>>,
}

/// Unvalidated mirror used for deserialization.
#[derive(Debug, Clone, Deserialize)]
struct RawSimulationProperties {
    duration: Scalar,
    segment_duration: Scalar,
    /// Defaults to [`DEFAULT_DT`] when the config omits it.
    #[serde(default = "default_dt")]
    dt: Scalar,
    #[serde(default)]
    key_timepoints: Option<Vec<Scalar>>,
}

fn default_dt() -> Scalar {
    DEFAULT_DT
}

impl TryFrom<RawSimulationProperties> for SimulationProperties {
    type Error = TendrilError;

    fn try_from(raw: RawSimulationProperties) -> TendrilResult<Self> {
        Self::new(raw.duration, raw.segment_duration, raw.dt, raw.key_timepoints)
    }
}

/// Returns true if `b` evenly divides `a` (within rounding tolerance —
/// binary floats make 0.6 / 0.3 land just off 2.0).
///
/// The tolerance scales with the ratio: the inputs are f32, so their
/// rounding error grows with the quotient, and a fixed absolute bound
/// would reject large exact grids (0.3 / 0.01 lands at 30.000004).
fn evenly_divides(a: Scalar, b: Scalar) -> bool {
    let ratio = a as f64 / b as f64;
    ratio >= 1.0 - DIVISIBILITY_TOLERANCE
        && (ratio - ratio.round()).abs() <= DIVISIBILITY_TOLERANCE * ratio.max(1.0)
}

impl SimulationProperties {
    /// Creates validated simulation properties.
    ///
    /// Rejects (fatal, not retried):
    /// - non-positive `duration`, `segment_duration`, or `dt`
    /// - `segment_duration` not evenly dividing `duration`
    /// - `dt` not evenly dividing `segment_duration`
    /// - key timepoints that are not strictly increasing, do not span
    ///   `[0, duration]`, or whose spacings do not evenly divide
    ///   `duration`
    pub fn new(
        duration: Scalar,
        segment_duration: Scalar,
        dt: Scalar,
        key_timepoints: Option<Vec<Scalar>>,
    ) -> TendrilResult<Self> {
        for (name, value) in [
            ("duration", duration),
            ("segment_duration", segment_duration),
            ("dt", dt),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(TendrilError::InvalidConfig(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        if !evenly_divides(duration, segment_duration) {
            return Err(TendrilError::InvalidConfig(format!(
                "segment_duration ({segment_duration}) must evenly divide duration ({duration})"
            )));
        }
        if !evenly_divides(segment_duration, dt) {
            return Err(TendrilError::InvalidConfig(format!(
                "dt ({dt}) must evenly divide segment_duration ({segment_duration})"
            )));
        }

        if let Some(keys) = &key_timepoints {
            if keys.len() < 2 {
                return Err(TendrilError::InvalidConfig(format!(
                    "key_timepoints needs at least 2 entries, got {}",
                    keys.len()
                )));
            }
            for pair in keys.windows(2) {
                if pair[1] <= pair[0] {
                    return Err(TendrilError::InvalidConfig(format!(
                        "key_timepoints must be strictly increasing, got {} after {}",
                        pair[1], pair[0]
                    )));
                }
                if !evenly_divides(duration, pair[1] - pair[0]) {
                    return Err(TendrilError::InvalidConfig(format!(
                        "key-timepoint spacing ({}) must evenly divide duration ({duration})",
                        pair[1] - pair[0]
                    )));
                }
            }
            let first = keys[0] as f64;
            let last = *keys.last().expect("checked non-empty") as f64;
            if first.abs() > DIVISIBILITY_TOLERANCE {
                return Err(TendrilError::InvalidConfig(format!(
                    "key_timepoints must start at 0, got {first}"
                )));
            }
            if (last - duration as f64).abs() > DIVISIBILITY_TOLERANCE {
                return Err(TendrilError::InvalidConfig(format!(
                    "key_timepoints must end at the duration ({duration}), got {last}"
                )));
            }
        }

        Ok(Self {
            duration,
            segment_duration,
            dt,
            key_timepoints,
        })
    }

    /// Total trajectory duration (seconds).
    #[inline]
    pub fn duration(&self) -> Scalar {
        self.duration
    }

    /// Duration of one checkpointed segment (seconds).
    #[inline]
    pub fn segment_duration(&self) -> Scalar {
        self.segment_duration
    }

    /// Fine timestep (seconds).
    #[inline]
    pub fn dt(&self) -> Scalar {
        self.dt
    }

    /// Key timepoints for time-variable schedules, if configured.
    #[inline]
    pub fn key_timepoints(&self) -> Option<&[Scalar]> {
        self.key_timepoints.as_deref()
    }

    /// Number of checkpointed segments in one trajectory.
    pub fn num_segments(&self) -> u32 {
        (self.duration as f64 / self.segment_duration as f64).round() as u32
    }

    /// Number of fine steps per segment.
    pub fn steps_per_segment(&self) -> u32 {
        (self.segment_duration as f64 / self.dt as f64).round() as u32
    }

    /// Total number of fine steps in one trajectory.
    pub fn num_steps(&self) -> u64 {
        self.num_segments() as u64 * self.steps_per_segment() as u64
    }
}
