//! Scene lifecycle: construction snapshot and exact reset.
//!
//! Optimization loops run many rollouts from the same initial
//! conditions. Rather than rebuilding meshes and integrator state
//! every iteration, the scene captures a snapshot at construction and
//! restores it on demand. Reset is exact: a rollout after reset
//! produces bitwise-identical results to a rollout on a fresh scene.

use glam::Vec3;
use tendril_mesh::Mesh;
use tendril_telemetry::{EventEmitter, EventKind, RolloutEvent};
use tendril_types::TendrilResult;

use crate::integrator::{Integrator, IntegratorState};

/// Initial conditions captured at scene construction.
#[derive(Debug, Clone)]
struct SceneSnapshot {
    position: Vec<Vec3>,
    velocity: Vec<Vec3>,
    integrator: IntegratorState,
}

/// The simulated world: one deformable mesh, static obstacle meshes,
/// and the integrator that advances it.
pub struct Scene {
    /// The cable-actuated deformable mesh.
    pub mesh: Mesh,
    /// Static collision geometry. Obstacles never move and carry no
    /// state to snapshot.
    pub obstacles: Vec<Mesh>,
    /// The differentiable one-step physics backend.
    pub integrator: Box<dyn Integrator>,
    initial: SceneSnapshot,
    telemetry: Option<EventEmitter>,
}

impl Scene {
    /// Validates the meshes and captures the initial snapshot.
    pub fn new(
        mesh: Mesh,
        obstacles: Vec<Mesh>,
        integrator: Box<dyn Integrator>,
    ) -> TendrilResult<Self> {
        mesh.validate()?;
        for obstacle in &obstacles {
            obstacle.validate()?;
        }
        let initial = SceneSnapshot {
            position: mesh.nodes.position.clone(),
            velocity: mesh.nodes.velocity.clone(),
            integrator: integrator.state(),
        };
        Ok(Self {
            mesh,
            obstacles,
            integrator,
            initial,
            telemetry: None,
        })
    }

    /// Attaches a telemetry emitter; resets announce themselves on it.
    pub fn with_telemetry(mut self, emitter: EventEmitter) -> Self {
        self.telemetry = Some(emitter);
        self
    }

    /// Restores the exact initial conditions captured at construction.
    pub fn reset(&mut self) -> TendrilResult<()> {
        self.mesh.nodes.position = self.initial.position.clone();
        self.mesh.nodes.velocity = self.initial.velocity.clone();
        self.mesh.nodes.clear_forces();
        self.integrator.restore(&self.initial.integrator)?;
        if let Some(emitter) = &self.telemetry {
            emitter.emit(RolloutEvent::new(0, EventKind::SceneReset));
        }
        Ok(())
    }

    /// Number of nodes in the deformable mesh.
    pub fn num_nodes(&self) -> usize {
        self.mesh.nodes.len()
    }
}
