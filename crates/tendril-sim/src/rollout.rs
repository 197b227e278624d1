//! Segmented checkpointed rollout with recompute-on-backward.
//!
//! The rollout divides simulated time into equal segments. The forward
//! pass stores only the node state at each segment start; the backward
//! sweep walks segments in reverse, restores each checkpoint,
//! re-executes the segment's forward steps to rebuild its per-step
//! records, then runs the adjoint steps in reverse order. Memory stays
//! proportional to one segment instead of the whole rollout.
//!
//! [`CheckpointMode::Unrolled`] retains every step record on the first
//! forward pass and skips recomputation. Because schedules are pure
//! functions of the global step index and the integrator contract
//! requires deterministic re-execution, both modes produce identical
//! gradients; unrolled mode trades memory for a faster backward sweep
//! on short rollouts.

use std::mem;
use std::time::Instant;

use glam::Vec3;
use tendril_cable::{Cable, Coupling};
use tendril_telemetry::{EventBus, EventKind, RolloutEvent};
use tendril_types::{Scalar, TendrilError, TendrilResult};

use crate::pipeline::{advance_step, step_backward, StepRecord};
use crate::properties::SimulationProperties;
use crate::scene::Scene;

/// Memory strategy for the backward pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointMode {
    /// Store segment-boundary state only; recompute per-step records
    /// during the backward sweep.
    Checkpointed,
    /// Retain every step record from the first forward pass.
    Unrolled,
}

/// Gradients of the loss w.r.t. the optimizable inputs.
#[derive(Debug, Clone)]
pub struct Gradients {
    /// Per-cable schedule-parameter gradients, matching each cable's
    /// `pull_ratio.params()` layout.
    pub pull_ratio: Vec<Vec<Scalar>>,
}

/// Node state saved at a segment boundary.
#[derive(Debug, Clone)]
struct Checkpoint {
    position: Vec<Vec3>,
    velocity: Vec<Vec3>,
}

/// A differentiable rollout over a scene.
///
/// Borrows the cables mutably for its lifetime: forward passes update
/// hole state in place, and the backward pass reads schedule
/// parameters through the same cables the gradients apply to.
pub struct Rollout<'a> {
    properties: &'a SimulationProperties,
    cables: &'a mut [Cable],
    couplings: &'a [Coupling],
    mode: CheckpointMode,
    telemetry: Option<&'a mut EventBus>,
    checkpoints: Vec<Checkpoint>,
    tapes: Vec<Vec<StepRecord>>,
}

impl<'a> Rollout<'a> {
    pub fn new(
        properties: &'a SimulationProperties,
        cables: &'a mut [Cable],
        couplings: &'a [Coupling],
        mode: CheckpointMode,
    ) -> TendrilResult<Self> {
        if cables.len() != couplings.len() {
            return Err(TendrilError::ShapeMismatch {
                context: "couplings per cable".to_string(),
                expected: cables.len(),
                actual: couplings.len(),
            });
        }
        Ok(Self {
            properties,
            cables,
            couplings,
            mode,
            telemetry: None,
            checkpoints: Vec::new(),
            tapes: Vec::new(),
        })
    }

    /// Attaches a telemetry bus; events are flushed at segment
    /// boundaries.
    pub fn with_telemetry(mut self, bus: &'a mut EventBus) -> Self {
        self.telemetry = Some(bus);
        self
    }

    fn emit(&mut self, step: u64, kind: EventKind) {
        if let Some(bus) = self.telemetry.as_deref_mut() {
            bus.emit(RolloutEvent::new(step, kind));
            bus.flush();
        }
    }

    /// Runs the full forward rollout, mutating the scene's node state
    /// in place. Returns the final node positions and velocities.
    pub fn forward(&mut self, scene: &mut Scene) -> TendrilResult<(Vec<Vec3>, Vec<Vec3>)> {
        let num_segments = self.properties.num_segments();
        let steps_per_segment = self.properties.steps_per_segment();
        let dt = self.properties.dt();

        self.checkpoints.clear();
        self.tapes.clear();

        let rollout_start = Instant::now();
        self.emit(
            0,
            EventKind::RolloutBegin {
                num_segments,
                steps_per_segment,
            },
        );

        let mut step: u64 = 0;
        for segment in 0..num_segments {
            self.checkpoints.push(Checkpoint {
                position: scene.mesh.nodes.position.clone(),
                velocity: scene.mesh.nodes.velocity.clone(),
            });

            let segment_start = Instant::now();
            let mut tape = Vec::new();
            for _ in 0..steps_per_segment {
                let record = advance_step(
                    &mut scene.mesh,
                    self.cables,
                    self.couplings,
                    scene.integrator.as_mut(),
                    dt,
                    step,
                )?;
                if self.mode == CheckpointMode::Unrolled {
                    tape.push(record);
                }
                step += 1;
            }
            if self.mode == CheckpointMode::Unrolled {
                self.tapes.push(tape);
            }

            self.emit(
                step,
                EventKind::SegmentForward {
                    segment,
                    recompute: false,
                    wall_time: segment_start.elapsed().as_secs_f64(),
                },
            );
        }

        self.emit(
            step,
            EventKind::RolloutEnd {
                wall_time: rollout_start.elapsed().as_secs_f64(),
            },
        );

        Ok((
            scene.mesh.nodes.position.clone(),
            scene.mesh.nodes.velocity.clone(),
        ))
    }

    /// Runs the backward sweep for the most recent forward rollout.
    ///
    /// `grad_position` and `grad_velocity` are the gradients of the
    /// loss w.r.t. the final node state that [`Rollout::forward`]
    /// returned. Node state in the scene is clobbered by checkpoint
    /// restoration; callers reset the scene before the next rollout.
    pub fn backward(
        &mut self,
        scene: &mut Scene,
        grad_position: &[Vec3],
        grad_velocity: &[Vec3],
    ) -> TendrilResult<Gradients> {
        if self.checkpoints.is_empty() {
            return Err(TendrilError::InvalidConfig(
                "backward requires a completed forward rollout".to_string(),
            ));
        }
        let n = scene.num_nodes();
        for (name, len) in [
            ("grad_position", grad_position.len()),
            ("grad_velocity", grad_velocity.len()),
        ] {
            if len != n {
                return Err(TendrilError::ShapeMismatch {
                    context: format!("rollout backward {name}"),
                    expected: n,
                    actual: len,
                });
            }
        }

        let num_segments = self.properties.num_segments();
        let steps_per_segment = self.properties.steps_per_segment();
        let dt = self.properties.dt();

        let mut schedule_grads: Vec<Vec<Scalar>> = self
            .cables
            .iter()
            .map(|c| vec![0.0; c.pull_ratio.params().len()])
            .collect();

        let mut grad_p = grad_position.to_vec();
        let mut grad_v = grad_velocity.to_vec();
        let mut tapes = mem::take(&mut self.tapes);

        for segment in (0..num_segments).rev() {
            let segment_start = Instant::now();

            let tape = match self.mode {
                CheckpointMode::Unrolled => tapes.pop().ok_or_else(|| {
                    TendrilError::InvalidConfig(
                        "unrolled rollout is missing a retained segment tape".to_string(),
                    )
                })?,
                CheckpointMode::Checkpointed => {
                    let checkpoint = &self.checkpoints[segment as usize];
                    scene.mesh.nodes.position = checkpoint.position.clone();
                    scene.mesh.nodes.velocity = checkpoint.velocity.clone();

                    let recompute_start = Instant::now();
                    let base = segment as u64 * steps_per_segment as u64;
                    let mut tape = Vec::with_capacity(steps_per_segment as usize);
                    for local in 0..steps_per_segment as u64 {
                        let record = advance_step(
                            &mut scene.mesh,
                            self.cables,
                            self.couplings,
                            scene.integrator.as_mut(),
                            dt,
                            base + local,
                        )?;
                        tape.push(record);
                    }
                    self.emit(
                        base + steps_per_segment as u64,
                        EventKind::SegmentForward {
                            segment,
                            recompute: true,
                            wall_time: recompute_start.elapsed().as_secs_f64(),
                        },
                    );
                    tape
                }
            };

            for record in tape.iter().rev() {
                let (p, v) = step_backward(
                    record,
                    self.cables,
                    self.couplings,
                    &grad_p,
                    &grad_v,
                    &mut schedule_grads,
                )?;
                grad_p = p;
                grad_v = v;
            }

            let last_step = tape.first().map(|r| r.step).unwrap_or(0);
            self.emit(
                last_step,
                EventKind::SegmentBackward {
                    segment,
                    wall_time: segment_start.elapsed().as_secs_f64(),
                },
            );
        }

        self.checkpoints.clear();

        Ok(Gradients {
            pull_ratio: schedule_grads,
        })
    }
}
