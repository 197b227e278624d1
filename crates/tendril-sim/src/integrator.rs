//! The time-integration boundary.
//!
//! The contact/integration kernel is an external collaborator: an
//! opaque, stateful, differentiable one-step primitive. The rollout
//! depends only on this forward/backward contract, never on the
//! integrator's internals.
//!
//! Reverse-mode support is modeled explicitly: `step` returns a
//! [`StepTrace`] — a captured computation record that, given gradients
//! of the loss w.r.t. the step's outputs, replays the step backwards
//! and returns gradients w.r.t. its inputs. This is the trait-level
//! rendition of an autodiff engine's custom operator (saved forward
//! inputs plus a reverse closure), with no autodiff framework in
//! sight.

use std::fmt;

use glam::Vec3;
use tendril_types::{Scalar, TendrilResult};

/// Inputs to one integration step.
///
/// `step` is the global fine-step index, carried for diagnostics only
/// — the integrator must not behave differently across recomputation.
#[derive(Debug, Clone, Copy)]
pub struct StepInput<'a> {
    /// External per-node force (N rows).
    pub force: &'a [Vec3],
    /// Current node positions.
    pub position: &'a [Vec3],
    /// Current node velocities.
    pub velocity: &'a [Vec3],
    /// Timestep (seconds).
    pub dt: Scalar,
    /// Global fine-step index.
    pub step: u64,
}

/// Outputs of one integration step: the advanced state plus the
/// captured trace for reverse-mode differentiation.
pub struct StepOutput {
    /// Node positions after the step.
    pub position: Vec<Vec3>,
    /// Node velocities after the step.
    pub velocity: Vec<Vec3>,
    /// Captured computation record for the backward pass.
    pub trace: Box<dyn StepTrace>,
}

// Manual impl: the trace is an opaque trait object with no Debug bound.
impl fmt::Debug for StepOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepOutput")
            .field("position", &self.position)
            .field("velocity", &self.velocity)
            .finish_non_exhaustive()
    }
}

/// Gradients of the loss w.r.t. one step's inputs.
#[derive(Debug, Clone)]
pub struct StepGrads {
    /// Gradient w.r.t. the external node force.
    pub force: Vec<Vec3>,
    /// Gradient w.r.t. the input node positions.
    pub position: Vec<Vec3>,
    /// Gradient w.r.t. the input node velocities.
    pub velocity: Vec<Vec3>,
}

/// A captured forward computation that can be replayed backwards.
pub trait StepTrace: Send {
    /// Given gradients of the loss w.r.t. this step's outputs, returns
    /// gradients w.r.t. its inputs.
    fn backward(&self, grad_position: &[Vec3], grad_velocity: &[Vec3])
        -> TendrilResult<StepGrads>;
}

/// Opaque snapshot of an integrator's internal particle state.
///
/// The scene lifecycle stores one of these at construction and hands
/// it back on reset. The reference integrator keeps no internal
/// evolving buffers and snapshots as empty; integrators that mirror
/// node state in device buffers serialize them here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntegratorState {
    /// Integrator-private buffers; the scene never interprets them.
    pub buffers: Vec<Vec<Scalar>>,
}

/// The opaque differentiable one-step physics primitive.
///
/// Contract: `step` performs exactly one semi-implicit step — resolve
/// contact against static geometry, apply the supplied external force,
/// integrate — and returns the next state plus its trace. Repeated
/// invocation with identical inputs must produce identical outputs
/// (checkpointed rollouts re-execute forward passes during the
/// backward sweep).
pub trait Integrator: Send {
    /// Advances node state by one `dt`.
    fn step(&mut self, input: StepInput<'_>) -> TendrilResult<StepOutput>;

    /// Snapshots internal particle state for the scene lifecycle.
    fn state(&self) -> IntegratorState;

    /// Restores internal particle state from a snapshot.
    fn restore(&mut self, state: &IntegratorState) -> TendrilResult<()>;
}
