//! Pull-ratio schedules — the control input being optimized.
//!
//! Both variants are pure functions of the *global* step index, with
//! no internal cursor. This is load-bearing: under checkpointed
//! rollouts a segment's forward pass runs twice (once normally, once
//! during backward recomputation), and any schedule with mutable
//! playback state would desynchronize between the two executions and
//! silently corrupt gradients. Repeated evaluation at the same index
//! must always return the identical value.
//!
//! Schedule values may go negative during optimization; clamping to
//! non-negative happens at the point of consumption (the force model),
//! not here.

use tendril_types::{Scalar, TendrilError, TendrilResult};

/// A tension-control schedule: pure `f(global_step_index) → value`,
/// parameterized by a flat vector of optimizable scalars.
pub trait PullRatio: std::fmt::Debug + Send {
    /// Raw (unclamped) schedule value at a global step index.
    fn value(&self, step: u64) -> Scalar;

    /// The optimizable parameters.
    fn params(&self) -> &[Scalar];

    /// Replaces the optimizable parameters (optimizer update).
    fn set_params(&mut self, params: &[Scalar]) -> TendrilResult<()>;

    /// Accumulates `upstream · ∂value(step)/∂params` into `grads`.
    ///
    /// `grads` must have `params().len()` entries.
    fn accumulate_grad(&self, step: u64, upstream: Scalar, grads: &mut [Scalar]);
}

/// One optimizable scalar applied at every step.
#[derive(Debug, Clone)]
pub struct TimeInvariablePullRatio {
    params: [Scalar; 1],
}

impl TimeInvariablePullRatio {
    /// Creates a constant schedule with the given initial value.
    pub fn new(value: Scalar) -> Self {
        Self { params: [value] }
    }
}

impl PullRatio for TimeInvariablePullRatio {
    fn value(&self, _step: u64) -> Scalar {
        self.params[0]
    }

    fn params(&self) -> &[Scalar] {
        &self.params
    }

    fn set_params(&mut self, params: &[Scalar]) -> TendrilResult<()> {
        if params.len() != 1 {
            return Err(TendrilError::ShapeMismatch {
                context: "time-invariable pull ratio params".into(),
                expected: 1,
                actual: params.len(),
            });
        }
        self.params[0] = params[0];
        Ok(())
    }

    fn accumulate_grad(&self, _step: u64, upstream: Scalar, grads: &mut [Scalar]) {
        grads[0] += upstream;
    }
}

/// Piecewise-linear schedule over key timepoints.
///
/// One optimizable scalar per key timepoint; the value at step `i` is
/// the linear interpolation between the two bracketing keys at time
/// `i · dt`. Key timepoints must be strictly increasing and span
/// `[0, duration]`; anything else is rejected, never corrected.
#[derive(Debug, Clone)]
pub struct TimeVariablePullRatio {
    timepoints: Vec<Scalar>,
    params: Vec<Scalar>,
    dt: Scalar,
    duration: Scalar,
}

impl TimeVariablePullRatio {
    /// Endpoint/ordering tolerance for key timepoints. Binary floats
    /// make literal equality on configured values meaningless.
    const TIME_TOLERANCE: f64 = 1.0e-6;

    /// Creates a time-variable schedule.
    ///
    /// `timepoints` and `values` are parallel arrays (one optimizable
    /// scalar per key timepoint).
    pub fn new(
        timepoints: Vec<Scalar>,
        values: Vec<Scalar>,
        dt: Scalar,
        duration: Scalar,
    ) -> TendrilResult<Self> {
        if timepoints.len() < 2 {
            return Err(TendrilError::InvalidConfig(format!(
                "Time-variable pull ratio needs at least 2 key timepoints, got {}",
                timepoints.len()
            )));
        }
        if values.len() != timepoints.len() {
            return Err(TendrilError::ShapeMismatch {
                context: "pull ratio key values".into(),
                expected: timepoints.len(),
                actual: values.len(),
            });
        }
        if dt <= 0.0 {
            return Err(TendrilError::InvalidConfig(
                "Timestep dt must be positive".into(),
            ));
        }
        for pair in timepoints.windows(2) {
            if pair[1] <= pair[0] {
                return Err(TendrilError::InvalidConfig(format!(
                    "Key timepoints must be strictly increasing, got {} after {}",
                    pair[1], pair[0]
                )));
            }
        }
        let first = timepoints[0] as f64;
        let last = *timepoints.last().expect("checked non-empty") as f64;
        if first.abs() > Self::TIME_TOLERANCE {
            return Err(TendrilError::InvalidConfig(format!(
                "Key timepoints must start at 0, got {first}"
            )));
        }
        if (last - duration as f64).abs() > Self::TIME_TOLERANCE {
            return Err(TendrilError::InvalidConfig(format!(
                "Key timepoints must end at the duration ({duration}), got {last}"
            )));
        }

        Ok(Self {
            timepoints,
            params: values,
            dt,
            duration,
        })
    }

    /// Bracketing key interval and interpolation weight for a step.
    ///
    /// Returns `(lower_key_index, weight)` with `weight ∈ [0, 1]`.
    /// Computed in f64 so that forward and recomputed-forward passes
    /// agree bit-for-bit.
    fn bracket(&self, step: u64) -> (usize, f64) {
        let t = (step as f64 * self.dt as f64).min(self.duration as f64);

        // Last interval whose start is at or before t.
        let mut lower = self.timepoints.len() - 2;
        for j in 0..self.timepoints.len() - 1 {
            if t < self.timepoints[j + 1] as f64 {
                lower = j;
                break;
            }
        }

        let t0 = self.timepoints[lower] as f64;
        let t1 = self.timepoints[lower + 1] as f64;
        let weight = ((t - t0) / (t1 - t0)).clamp(0.0, 1.0);
        (lower, weight)
    }
}

impl PullRatio for TimeVariablePullRatio {
    fn value(&self, step: u64) -> Scalar {
        let (lower, w) = self.bracket(step);
        let y0 = self.params[lower] as f64;
        let y1 = self.params[lower + 1] as f64;
        (y0 + (y1 - y0) * w) as Scalar
    }

    fn params(&self) -> &[Scalar] {
        &self.params
    }

    fn set_params(&mut self, params: &[Scalar]) -> TendrilResult<()> {
        if params.len() != self.params.len() {
            return Err(TendrilError::ShapeMismatch {
                context: "time-variable pull ratio params".into(),
                expected: self.params.len(),
                actual: params.len(),
            });
        }
        self.params.copy_from_slice(params);
        Ok(())
    }

    fn accumulate_grad(&self, step: u64, upstream: Scalar, grads: &mut [Scalar]) {
        let (lower, w) = self.bracket(step);
        grads[lower] += upstream * (1.0 - w) as Scalar;
        grads[lower + 1] += upstream * w as Scalar;
    }
}
