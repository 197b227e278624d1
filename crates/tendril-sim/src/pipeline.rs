//! One fine step of the coupled cable/mesh pipeline.
//!
//! Forward order per step: clear forces, gather hole state from node
//! state, evaluate each cable's pull schedule and tension forces,
//! scatter hole forces back onto the nodes, integrate. The backward
//! pass replays the same stages in reverse, propagating adjoints
//! through the integrator trace, the scatter/gather transposes, and
//! the force model.

use glam::Vec3;
use tendril_cable::{cable_force, cable_force_backward, Cable, Coupling};
use tendril_mesh::Mesh;
use tendril_types::{Scalar, TendrilError, TendrilResult};

use crate::integrator::{Integrator, StepTrace};

/// Per-cable saved state for one step's backward replay.
#[derive(Debug, Clone)]
pub struct CableStepRecord {
    /// Hole positions at the start of the step (tangent inputs).
    pub hole_position: Vec<Vec3>,
    /// Unclamped schedule output at this step.
    pub raw_pull: Scalar,
}

/// Everything one fine step must save to run its backward pass.
pub struct StepRecord {
    /// Global fine-step index.
    pub step: u64,
    /// Per-cable saved inputs, in cable order.
    pub cables: Vec<CableStepRecord>,
    /// Integrator-captured computation record.
    pub trace: Box<dyn StepTrace>,
}

/// Advances the coupled system by one fine step, mutating mesh nodes
/// and cable hole state in place. Returns the record needed to replay
/// the step backwards.
pub fn advance_step(
    mesh: &mut Mesh,
    cables: &mut [Cable],
    couplings: &[Coupling],
    integrator: &mut dyn Integrator,
    dt: Scalar,
    step: u64,
) -> TendrilResult<StepRecord> {
    if cables.len() != couplings.len() {
        return Err(TendrilError::ShapeMismatch {
            context: "couplings per cable".to_string(),
            expected: cables.len(),
            actual: couplings.len(),
        });
    }

    mesh.nodes.clear_forces();
    let mut records = Vec::with_capacity(cables.len());

    for (cable, coupling) in cables.iter_mut().zip(couplings) {
        let hole_position = coupling.gather_values(&mesh.nodes.position)?;
        let hole_velocity = coupling.gather_values(&mesh.nodes.velocity)?;

        let raw_pull = cable.pull_ratio.value(step);
        let hole_force = cable_force(
            &hole_position,
            &hole_velocity,
            raw_pull,
            cable.stiffness,
            cable.damping,
        )?;

        let node_force = coupling.scatter_values(&hole_force)?;
        for (nf, add) in mesh.nodes.force.iter_mut().zip(&node_force) {
            *nf += *add;
        }

        records.push(CableStepRecord {
            hole_position: hole_position.clone(),
            raw_pull,
        });

        cable.holes.position = hole_position;
        cable.holes.velocity = hole_velocity;
        cable.holes.force = hole_force;
    }

    let output = integrator.step(crate::integrator::StepInput {
        force: &mesh.nodes.force,
        position: &mesh.nodes.position,
        velocity: &mesh.nodes.velocity,
        dt,
        step,
    })?;

    mesh.nodes.position = output.position;
    mesh.nodes.velocity = output.velocity;

    Ok(StepRecord {
        step,
        cables: records,
        trace: output.trace,
    })
}

/// Runs one step's adjoint: consumes gradients w.r.t. the step's
/// output node state and returns gradients w.r.t. its input node
/// state, accumulating schedule-parameter gradients into
/// `schedule_grads` (one slice per cable, matching `params()` length).
pub fn step_backward(
    record: &StepRecord,
    cables: &[Cable],
    couplings: &[Coupling],
    grad_position: &[Vec3],
    grad_velocity: &[Vec3],
    schedule_grads: &mut [Vec<Scalar>],
) -> TendrilResult<(Vec<Vec3>, Vec<Vec3>)> {
    let grads = record.trace.backward(grad_position, grad_velocity)?;

    let mut grad_p = grads.position;
    let mut grad_v = grads.velocity;

    for (i, (cable, coupling)) in cables.iter().zip(couplings).enumerate() {
        let saved = &record.cables[i];

        // Force flowed nodes <- scatter <- holes, so its adjoint flows
        // holes <- scatter^T <- nodes.
        let grad_hole_force = coupling.scatter_adjoint(&grads.force)?;
        let cf = cable_force_backward(
            &saved.hole_position,
            saved.raw_pull,
            cable.stiffness,
            cable.damping,
            &grad_hole_force,
        )?;

        cable
            .pull_ratio
            .accumulate_grad(record.step, cf.pull_ratio, &mut schedule_grads[i]);

        let node_dp = coupling.gather_adjoint(&cf.position)?;
        let node_dv = coupling.gather_adjoint(&cf.velocity)?;
        for ((gp, gv), (dp, dv)) in grad_p
            .iter_mut()
            .zip(grad_v.iter_mut())
            .zip(node_dp.iter().zip(&node_dv))
        {
            *gp += *dp;
            *gv += *dv;
        }
    }

    Ok((grad_p, grad_v))
}
