//! Reference semi-implicit Euler integrator with ground contact.
//!
//! World construction lumps tetrahedral mass onto vertices and maps a
//! frozen bounding box onto zero inverse masses. The integrator itself
//! is a plain CPU kernel behind the [`Integrator`] trait, with an
//! analytic backward pass.

use std::sync::Arc;

use glam::Vec3;
use tendril_types::{constants, Scalar, TendrilError, TendrilResult};
use tendril_mesh::Mesh;

use crate::integrator::{
    Integrator, IntegratorState, StepGrads, StepInput, StepOutput, StepTrace,
};

/// Ground-plane penalty contact parameters.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct ContactProperties {
    /// Whether the ground plane is active.
    pub ground: bool,
    /// Height of the ground plane along +Y.
    pub ground_height: Scalar,
    /// Penalty stiffness.
    pub ke: Scalar,
    /// Penalty damping.
    pub kd: Scalar,
}

impl Default for ContactProperties {
    fn default() -> Self {
        Self {
            ground: true,
            ground_height: 0.0,
            ke: 1.0e2,
            kd: 1.0,
        }
    }
}

/// Static per-node world data shared by forward steps and their traces.
#[derive(Debug, Clone)]
pub struct WorldModel {
    inv_mass: Arc<Vec<Scalar>>,
    gravity: Vec3,
    contact: Option<ContactProperties>,
}

impl WorldModel {
    /// Per-node inverse masses (zero for frozen nodes).
    pub fn inv_mass(&self) -> &[Scalar] {
        &self.inv_mass
    }

    /// Gravitational acceleration vector.
    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Ground contact parameters, if contact is enabled.
    pub fn contact(&self) -> Option<&ContactProperties> {
        self.contact.as_ref()
    }
}

/// Builds a [`WorldModel`] from a mesh: lumped vertex masses from the
/// tetrahedral volumes, frozen nodes from the mesh's bounding box.
#[derive(Debug)]
pub struct WorldModelBuilder<'a> {
    mesh: &'a Mesh,
    gravity: Vec3,
    contact: Option<ContactProperties>,
}

impl<'a> WorldModelBuilder<'a> {
    pub fn new(mesh: &'a Mesh) -> Self {
        Self {
            mesh,
            gravity: Vec3::new(0.0, -constants::GRAVITY, 0.0),
            contact: None,
        }
    }

    /// Overrides the gravitational acceleration.
    pub fn gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Enables ground-plane penalty contact.
    pub fn contact(mut self, contact: ContactProperties) -> Self {
        self.contact = Some(contact);
        self
    }

    /// Computes lumped masses and frozen-node assignments.
    ///
    /// Each tetrahedron distributes `density * |volume| / 4` to its
    /// four vertices. A node that receives no mass from any element
    /// cannot be integrated and is rejected.
    pub fn build(self) -> TendrilResult<WorldModel> {
        let mesh = self.mesh;
        let density = mesh.properties.density;
        let num_nodes = mesh.nodes.len();

        let mut mass = vec![0.0 as Scalar; num_nodes];
        for (t, tet) in mesh.elements.tetrahedra.iter().enumerate() {
            let share = density * mesh.tetrahedron_volume(t).abs() / 4.0;
            for &v in tet {
                mass[v as usize] += share;
            }
        }

        let mut inv_mass = vec![0.0 as Scalar; num_nodes];
        for (i, &m) in mass.iter().enumerate() {
            if m <= 0.0 {
                return Err(TendrilError::InvalidMesh(format!(
                    "node {i} has zero lumped mass (not referenced by any tetrahedron)"
                )));
            }
            inv_mass[i] = 1.0 / m;
        }

        if let Some([lo, hi]) = mesh.properties.frozen_bounding_box {
            let lo = Vec3::from(lo);
            let hi = Vec3::from(hi);
            for (i, p) in mesh.nodes.position.iter().enumerate() {
                let inside = p.x >= lo.x
                    && p.y >= lo.y
                    && p.z >= lo.z
                    && p.x <= hi.x
                    && p.y <= hi.y
                    && p.z <= hi.z;
                if inside {
                    inv_mass[i] = 0.0;
                }
            }
        }

        Ok(WorldModel {
            inv_mass: Arc::new(inv_mass),
            gravity: self.gravity,
            contact: self.contact,
        })
    }
}

/// Semi-implicit Euler: `v' = v + dt * a`, `p' = p + dt * v'`.
///
/// Frozen nodes (zero inverse mass) keep their velocity and advect
/// with it, so a frozen node with zero initial velocity stays put.
#[derive(Debug, Clone)]
pub struct SemiImplicitIntegrator {
    world: WorldModel,
}

impl SemiImplicitIntegrator {
    pub fn new(world: WorldModel) -> Self {
        Self { world }
    }

    pub fn world(&self) -> &WorldModel {
        &self.world
    }
}

impl Integrator for SemiImplicitIntegrator {
    fn step(&mut self, input: StepInput<'_>) -> TendrilResult<StepOutput> {
        let n = self.world.inv_mass.len();
        for (name, len) in [
            ("force", input.force.len()),
            ("position", input.position.len()),
            ("velocity", input.velocity.len()),
        ] {
            if len != n {
                return Err(TendrilError::ShapeMismatch {
                    context: format!("integrator step {name}"),
                    expected: n,
                    actual: len,
                });
            }
        }

        let dt = input.dt;
        let contact = self.world.contact;
        let mut contact_mask = vec![false; n];
        let mut position = Vec::with_capacity(n);
        let mut velocity = Vec::with_capacity(n);

        for i in 0..n {
            let inv_m = self.world.inv_mass[i];
            let p = input.position[i];
            let v = input.velocity[i];

            let mut f = input.force[i];
            if let Some(c) = contact {
                if c.ground && inv_m > 0.0 && p.y < c.ground_height {
                    contact_mask[i] = true;
                    f.y += c.ke * (c.ground_height - p.y) - c.kd * v.y;
                }
            }

            let v_next = if inv_m > 0.0 {
                v + dt * (self.world.gravity + f * inv_m)
            } else {
                v
            };
            let p_next = p + dt * v_next;

            if !p_next.is_finite() || !v_next.is_finite() {
                return Err(TendrilError::NonFinite {
                    context: format!("integrator output at node {i}"),
                    step: input.step,
                });
            }

            position.push(p_next);
            velocity.push(v_next);
        }

        let trace = SemiImplicitTrace {
            inv_mass: Arc::clone(&self.world.inv_mass),
            contact_mask,
            ke: contact.map(|c| c.ke).unwrap_or(0.0),
            kd: contact.map(|c| c.kd).unwrap_or(0.0),
            dt,
        };

        Ok(StepOutput {
            position,
            velocity,
            trace: Box::new(trace),
        })
    }

    fn state(&self) -> IntegratorState {
        // All evolving state lives in the mesh nodes; nothing to save.
        IntegratorState::default()
    }

    fn restore(&mut self, state: &IntegratorState) -> TendrilResult<()> {
        if !state.buffers.is_empty() {
            return Err(TendrilError::Integrator(
                "semi-implicit integrator carries no internal buffers".to_string(),
            ));
        }
        Ok(())
    }
}

/// Saved forward data for one semi-implicit step.
///
/// The step is affine in its inputs once the contact activation set is
/// fixed, so the trace keeps only the mask and the constants.
#[derive(Debug, Clone)]
struct SemiImplicitTrace {
    inv_mass: Arc<Vec<Scalar>>,
    contact_mask: Vec<bool>,
    ke: Scalar,
    kd: Scalar,
    dt: Scalar,
}

impl StepTrace for SemiImplicitTrace {
    fn backward(
        &self,
        grad_position: &[Vec3],
        grad_velocity: &[Vec3],
    ) -> TendrilResult<StepGrads> {
        let n = self.inv_mass.len();
        for (name, len) in [
            ("grad_position", grad_position.len()),
            ("grad_velocity", grad_velocity.len()),
        ] {
            if len != n {
                return Err(TendrilError::ShapeMismatch {
                    context: format!("integrator backward {name}"),
                    expected: n,
                    actual: len,
                });
            }
        }

        let dt = self.dt;
        let mut grad_force = Vec::with_capacity(n);
        let mut grad_p = Vec::with_capacity(n);
        let mut grad_v = Vec::with_capacity(n);

        for i in 0..n {
            let inv_m = self.inv_mass[i];
            // p' = p + dt * v', so dL/dv' picks up dt * dL/dp'.
            let dv_total = grad_velocity[i] + dt * grad_position[i];

            let mut dp = grad_position[i];
            let mut dv = dv_total;
            let df = dt * inv_m * dv_total;

            if self.contact_mask[i] {
                // f_contact.y = ke * (h - p.y) - kd * v.y
                let pull = dv_total.y * dt * inv_m;
                dp.y -= pull * self.ke;
                dv.y -= pull * self.kd;
            }

            grad_force.push(df);
            grad_p.push(dp);
            grad_v.push(dv);
        }

        Ok(StepGrads {
            force: grad_force,
            position: grad_p,
            velocity: grad_v,
        })
    }
}
