//! Integration tests for tendril-sim.

use std::sync::{Arc, Mutex};

use glam::Vec3;
use tendril_cable::{Cable, Coupling, CouplingFactory, Holes, TimeInvariablePullRatio};
use tendril_mesh::generators::single_tetrahedron;
use tendril_sim::{
    CheckpointMode, ContactProperties, Gradients, Integrator, Rollout, Scene,
    SemiImplicitIntegrator, SimulationProperties, StepInput, WorldModelBuilder,
};
use tendril_telemetry::{EventBus, EventKind, EventSink, RolloutEvent};
use tendril_types::{Scalar, TendrilError};

fn holes_inside_unit_tet() -> Holes {
    // Both points are strictly inside the unit corner tetrahedron,
    // ordered by ascending height.
    Holes::at_rest(vec![Vec3::new(0.2, 0.1, 0.2), Vec3::new(0.15, 0.4, 0.15)]).unwrap()
}

/// Unit-tet scene with one cable, zero gravity, and no contact, so the
/// only dynamics come from the cable tension.
fn cable_scene(pull: Scalar) -> (Scene, Vec<Cable>, Vec<Coupling>) {
    let mesh = single_tetrahedron(1.0);
    let holes = holes_inside_unit_tet();
    let coupling = CouplingFactory::new(&mesh, &holes).create().unwrap();

    let cable = Cable::new(
        holes,
        Box::new(TimeInvariablePullRatio::new(pull)),
        50.0,
        0.1,
    )
    .unwrap();

    let world = WorldModelBuilder::new(&mesh)
        .gravity(Vec3::ZERO)
        .build()
        .unwrap();
    let scene = Scene::new(mesh, Vec::new(), Box::new(SemiImplicitIntegrator::new(world))).unwrap();

    (scene, vec![cable], vec![coupling])
}

fn demo_properties() -> SimulationProperties {
    // 3 segments of 2 fine steps each.
    SimulationProperties::new(0.06, 0.02, 0.01, None).unwrap()
}

/// Per-node loss weights with distinct magnitudes, so gradient errors
/// cannot cancel across nodes.
fn loss_weights(n: usize) -> Vec<Vec3> {
    (0..n).map(|i| Vec3::splat((i + 1) as Scalar * 0.1)).collect()
}

fn run_rollout(pull: Scalar, mode: CheckpointMode) -> (Vec<Vec3>, Gradients) {
    let (mut scene, mut cables, couplings) = cable_scene(pull);
    let properties = demo_properties();
    let mut rollout = Rollout::new(&properties, &mut cables, &couplings, mode).unwrap();

    let (position, _velocity) = rollout.forward(&mut scene).unwrap();
    let grad_position = loss_weights(position.len());
    let grad_velocity = vec![Vec3::ZERO; position.len()];
    let gradients = rollout
        .backward(&mut scene, &grad_position, &grad_velocity)
        .unwrap();

    (position, gradients)
}

// ─── Simulation properties ───────────────────────────────────

#[test]
fn segment_duration_must_divide_duration() {
    let err = SimulationProperties::new(0.5, 0.3, 0.01, None).unwrap_err();
    assert!(matches!(err, TendrilError::InvalidConfig(_)));

    let props = SimulationProperties::new(0.6, 0.3, 0.01, None).unwrap();
    assert_eq!(props.num_segments(), 2);
    assert_eq!(props.steps_per_segment(), 30);
    assert_eq!(props.num_steps(), 60);
}

#[test]
fn dt_must_divide_segment_duration() {
    assert!(SimulationProperties::new(0.6, 0.3, 0.007, None).is_err());
}

#[test]
fn fine_grids_survive_f32_ratio_rounding() {
    // 0.3 / 0.01 lands at 30.000004 in f32; an exact grid must not be
    // rejected because rounding error scaled with the quotient.
    let props = SimulationProperties::new(0.6, 0.3, 0.01, None).unwrap();
    assert_eq!(props.steps_per_segment(), 30);

    let dt = 1.0 / 1800.0;
    let props = SimulationProperties::new(1.0, 0.5, dt, None).unwrap();
    assert_eq!(props.steps_per_segment(), 900);
}

#[test]
fn deserialized_config_is_validated_and_defaults_dt() {
    let props: SimulationProperties =
        serde_json::from_str(r#"{"duration": 1.0, "segment_duration": 0.5}"#).unwrap();
    assert_eq!(props.dt(), tendril_types::constants::DEFAULT_DT);
    assert_eq!(props.num_segments(), 2);

    // Validation runs during deserialization, not just in `new`.
    let bad: Result<SimulationProperties, _> =
        serde_json::from_str(r#"{"duration": 0.5, "segment_duration": 0.3}"#);
    assert!(bad.is_err());
}

#[test]
fn key_timepoints_must_span_the_duration() {
    // Valid: evenly spaced keys covering [0, duration].
    let props = SimulationProperties::new(0.6, 0.3, 0.01, Some(vec![0.0, 0.2, 0.4, 0.6]));
    assert!(props.is_ok());

    // Last key short of the duration.
    assert!(SimulationProperties::new(0.6, 0.3, 0.01, Some(vec![0.0, 0.2, 0.5])).is_err());
    // First key not at 0.
    assert!(SimulationProperties::new(0.6, 0.3, 0.01, Some(vec![0.1, 0.3, 0.6])).is_err());
}

// ─── World model ─────────────────────────────────────────────

#[test]
fn lumped_mass_totals_density_times_volume() {
    let mesh = single_tetrahedron(1.0);
    let world = WorldModelBuilder::new(&mesh).build().unwrap();

    let total_mass: Scalar = world.inv_mass().iter().map(|&im| 1.0 / im).sum();
    let expected = mesh.properties.density * mesh.volume();
    assert!(
        (total_mass - expected).abs() < expected * 1e-5,
        "lumped mass {total_mass} vs density*volume {expected}"
    );
}

#[test]
fn frozen_bounding_box_zeroes_inverse_mass() {
    let mut mesh = single_tetrahedron(1.0);
    // Freeze the base: everything at y <= 0.
    mesh.properties.frozen_bounding_box = Some([[-1.0, -1.0, -1.0], [2.0, 0.0, 2.0]]);
    let world = WorldModelBuilder::new(&mesh).build().unwrap();

    for (i, p) in mesh.nodes.position.iter().enumerate() {
        if p.y <= 0.0 {
            assert_eq!(world.inv_mass()[i], 0.0, "node {i} should be frozen");
        } else {
            assert!(world.inv_mass()[i] > 0.0, "node {i} should be free");
        }
    }
}

#[test]
fn frozen_nodes_stay_put_under_gravity() {
    let mut mesh = single_tetrahedron(1.0);
    mesh.properties.frozen_bounding_box = Some([[-1.0; 3], [2.0; 3]]);
    let world = WorldModelBuilder::new(&mesh).build().unwrap();
    let mut integrator = SemiImplicitIntegrator::new(world);

    let n = mesh.nodes.len();
    let force = vec![Vec3::ZERO; n];
    let output = integrator
        .step(StepInput {
            force: &force,
            position: &mesh.nodes.position,
            velocity: &mesh.nodes.velocity,
            dt: 0.01,
            step: 0,
        })
        .unwrap();

    for (before, after) in mesh.nodes.position.iter().zip(&output.position) {
        assert_eq!(*before, *after);
    }
}

#[test]
fn unreferenced_node_is_rejected() {
    let mut mesh = single_tetrahedron(1.0);
    mesh.nodes.position.push(Vec3::new(5.0, 5.0, 5.0));
    mesh.nodes.velocity.push(Vec3::ZERO);
    mesh.nodes.force.push(Vec3::ZERO);

    let err = WorldModelBuilder::new(&mesh).build().unwrap_err();
    assert!(err.to_string().contains("zero lumped mass"), "{err}");
}

// ─── Semi-implicit integrator ────────────────────────────────

#[test]
fn step_matches_manual_semi_implicit_update() {
    let mesh = single_tetrahedron(1.0);
    let gravity = Vec3::new(0.0, -9.8, 0.0);
    let world = WorldModelBuilder::new(&mesh).gravity(gravity).build().unwrap();
    let inv_mass = world.inv_mass().to_vec();
    let mut integrator = SemiImplicitIntegrator::new(world);

    let n = mesh.nodes.len();
    let dt = 0.01;
    let force: Vec<Vec3> = (0..n).map(|i| Vec3::splat(i as Scalar)).collect();
    let output = integrator
        .step(StepInput {
            force: &force,
            position: &mesh.nodes.position,
            velocity: &mesh.nodes.velocity,
            dt,
            step: 0,
        })
        .unwrap();

    for i in 0..n {
        let v_expected =
            mesh.nodes.velocity[i] + dt * (gravity + force[i] * inv_mass[i]);
        let p_expected = mesh.nodes.position[i] + dt * v_expected;
        assert_eq!(output.velocity[i], v_expected, "node {i} velocity");
        assert_eq!(output.position[i], p_expected, "node {i} position");
    }
}

#[test]
fn step_output_debug_formats_state() {
    let mesh = single_tetrahedron(1.0);
    let world = WorldModelBuilder::new(&mesh).build().unwrap();
    let mut integrator = SemiImplicitIntegrator::new(world);

    let force = vec![Vec3::ZERO; mesh.nodes.len()];
    let output = integrator
        .step(StepInput {
            force: &force,
            position: &mesh.nodes.position,
            velocity: &mesh.nodes.velocity,
            dt: 0.01,
            step: 0,
        })
        .unwrap();

    let rendered = format!("{output:?}");
    assert!(rendered.contains("position"));
    assert!(rendered.contains("velocity"));
}

#[test]
fn ground_contact_pushes_penetrating_nodes_up() {
    let mut mesh = single_tetrahedron(1.0);
    // Sink the whole mesh below the ground plane at rest.
    for p in &mut mesh.nodes.position {
        p.y -= 2.0;
    }
    let world = WorldModelBuilder::new(&mesh)
        .gravity(Vec3::ZERO)
        .contact(ContactProperties {
            ground: true,
            ground_height: 0.0,
            ke: 1.0e3,
            kd: 0.0,
        })
        .build()
        .unwrap();
    let mut integrator = SemiImplicitIntegrator::new(world);

    let force = vec![Vec3::ZERO; mesh.nodes.len()];
    let output = integrator
        .step(StepInput {
            force: &force,
            position: &mesh.nodes.position,
            velocity: &mesh.nodes.velocity,
            dt: 0.01,
            step: 0,
        })
        .unwrap();

    for (i, v) in output.velocity.iter().enumerate() {
        assert!(v.y > 0.0, "node {i} should be pushed up, got {v:?}");
    }
}

#[test]
fn non_finite_force_is_a_hard_failure() {
    let mesh = single_tetrahedron(1.0);
    let world = WorldModelBuilder::new(&mesh).build().unwrap();
    let mut integrator = SemiImplicitIntegrator::new(world);

    let mut force = vec![Vec3::ZERO; mesh.nodes.len()];
    force[1] = Vec3::new(Scalar::NAN, 0.0, 0.0);
    let err = integrator
        .step(StepInput {
            force: &force,
            position: &mesh.nodes.position,
            velocity: &mesh.nodes.velocity,
            dt: 0.01,
            step: 7,
        })
        .unwrap_err();
    assert!(
        matches!(err, TendrilError::NonFinite { step: 7, .. }),
        "{err}"
    );
}

#[test]
fn trace_backward_matches_finite_differences() {
    let mesh = single_tetrahedron(1.0);
    let world = WorldModelBuilder::new(&mesh)
        .contact(ContactProperties {
            ground: true,
            ground_height: 0.5,
            ke: 10.0,
            kd: 0.5,
        })
        .build()
        .unwrap();
    let mut integrator = SemiImplicitIntegrator::new(world);

    let n = mesh.nodes.len();
    let dt = 0.01;
    let base_force: Vec<Vec3> = (0..n).map(|i| Vec3::splat(0.3 * (i as Scalar + 1.0))).collect();
    let weights = loss_weights(n);

    let base = integrator
        .step(StepInput {
            force: &base_force,
            position: &mesh.nodes.position,
            velocity: &mesh.nodes.velocity,
            dt,
            step: 0,
        })
        .unwrap();
    let grads = base.trace.backward(&weights, &weights).unwrap();

    // Scalar loss of one step's outputs: L = Σ w·p' + Σ w·v'.
    let mut loss = |force: &[Vec3]| -> f64 {
        let out = integrator
            .step(StepInput {
                force,
                position: &mesh.nodes.position,
                velocity: &mesh.nodes.velocity,
                dt,
                step: 0,
            })
            .unwrap();
        let mut l = 0.0f64;
        for i in 0..n {
            l += weights[i].dot(out.position[i]) as f64;
            l += weights[i].dot(out.velocity[i]) as f64;
        }
        l
    };

    // The step is affine in the applied force (the contact activation
    // set depends only on the input positions), so a large probe keeps
    // central differences exact and well above f32 rounding noise.
    let h = 1.0;
    for i in 0..n {
        for axis in 0..3 {
            let mut plus = base_force.clone();
            let mut minus = base_force.clone();
            plus[i][axis] += h;
            minus[i][axis] -= h;
            let fd = (loss(&plus) - loss(&minus)) / (2.0 * h as f64);
            let analytic = grads.force[i][axis] as f64;
            assert!(
                (fd - analytic).abs() < 1.0e-6 + 1.0e-2 * analytic.abs(),
                "force grad node {i} axis {axis}: fd {fd} vs analytic {analytic}"
            );
        }
    }
}

// ─── Scene lifecycle ─────────────────────────────────────────

#[test]
fn reset_restores_bitwise_identical_rollouts() {
    let (mut scene, mut cables, couplings) = cable_scene(0.05);
    let properties = demo_properties();

    let first = {
        let mut rollout = Rollout::new(
            &properties,
            &mut cables,
            &couplings,
            CheckpointMode::Checkpointed,
        )
        .unwrap();
        rollout.forward(&mut scene).unwrap()
    };

    scene.reset().unwrap();

    let second = {
        let mut rollout = Rollout::new(
            &properties,
            &mut cables,
            &couplings,
            CheckpointMode::Checkpointed,
        )
        .unwrap();
        rollout.forward(&mut scene).unwrap()
    };

    for (a, b) in first.0.iter().zip(&second.0) {
        for axis in 0..3 {
            assert_eq!(
                a[axis].to_bits(),
                b[axis].to_bits(),
                "position diverged after reset"
            );
        }
    }
    for (a, b) in first.1.iter().zip(&second.1) {
        for axis in 0..3 {
            assert_eq!(
                a[axis].to_bits(),
                b[axis].to_bits(),
                "velocity diverged after reset"
            );
        }
    }
}

#[test]
fn obstacles_are_validated_at_construction() {
    let mesh = single_tetrahedron(1.0);
    let world = WorldModelBuilder::new(&mesh).build().unwrap();

    let mut bad = single_tetrahedron(1.0);
    bad.elements.tetrahedra[0][0] = 99;
    let result = Scene::new(
        mesh,
        vec![bad],
        Box::new(SemiImplicitIntegrator::new(world)),
    );
    assert!(result.is_err());
}

// ─── Differentiable rollout ──────────────────────────────────

#[test]
fn checkpointed_and_unrolled_gradients_are_identical() {
    let (_, checkpointed) = run_rollout(0.05, CheckpointMode::Checkpointed);
    let (_, unrolled) = run_rollout(0.05, CheckpointMode::Unrolled);

    assert_eq!(checkpointed.pull_ratio.len(), unrolled.pull_ratio.len());
    for (a, b) in checkpointed.pull_ratio.iter().zip(&unrolled.pull_ratio) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert_eq!(x.to_bits(), y.to_bits(), "gradients diverged: {x} vs {y}");
        }
    }
}

#[test]
fn pull_gradient_matches_finite_differences() {
    let pull = 0.5;
    let (_, gradients) = run_rollout(pull, CheckpointMode::Checkpointed);
    assert_eq!(gradients.pull_ratio.len(), 1);
    assert_eq!(gradients.pull_ratio[0].len(), 1);
    let analytic = gradients.pull_ratio[0][0] as f64;

    let loss = |theta: Scalar| -> f64 {
        let (position, _) = run_rollout(theta, CheckpointMode::Checkpointed);
        let weights = loss_weights(position.len());
        position
            .iter()
            .zip(&weights)
            .map(|(p, w)| p.dot(*w) as f64)
            .sum()
    };

    // The probe must be large relative to f32 state quantization, and
    // must keep both probes on the unclamped side of the schedule.
    let h = 0.2;
    let fd = (loss(pull + h) - loss(pull - h)) / (2.0 * h as f64);
    assert!(
        (fd - analytic).abs() < 1.0e-7 + 5.0e-2 * analytic.abs().max(fd.abs()),
        "fd {fd} vs analytic {analytic}"
    );
    assert!(analytic != 0.0, "gradient should be non-zero");
}

#[test]
fn negative_pull_blocks_the_gradient() {
    let (_, gradients) = run_rollout(-0.5, CheckpointMode::Checkpointed);
    assert_eq!(gradients.pull_ratio[0][0], 0.0);
}

#[test]
fn backward_requires_a_forward_pass() {
    let (mut scene, mut cables, couplings) = cable_scene(0.05);
    let properties = demo_properties();
    let mut rollout = Rollout::new(
        &properties,
        &mut cables,
        &couplings,
        CheckpointMode::Checkpointed,
    )
    .unwrap();

    let n = scene.num_nodes();
    let zeros = vec![Vec3::ZERO; n];
    assert!(rollout.backward(&mut scene, &zeros, &zeros).is_err());
}

// ─── Telemetry integration ───────────────────────────────────

struct SharedSink(Arc<Mutex<Vec<RolloutEvent>>>);

impl EventSink for SharedSink {
    fn handle(&mut self, event: &RolloutEvent) {
        self.0.lock().unwrap().push(event.clone());
    }

    fn name(&self) -> &str {
        "shared_sink"
    }
}

#[test]
fn scene_reset_announces_itself() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut bus = EventBus::new();
    bus.add_sink(Box::new(SharedSink(Arc::clone(&events))));

    let mesh = single_tetrahedron(1.0);
    let world = WorldModelBuilder::new(&mesh).build().unwrap();
    let mut scene = Scene::new(mesh, Vec::new(), Box::new(SemiImplicitIntegrator::new(world)))
        .unwrap()
        .with_telemetry(bus.emitter());

    scene.reset().unwrap();
    bus.finalize();

    let events = events.lock().unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e.kind, EventKind::SceneReset)));
}

#[test]
fn rollout_emits_segment_events() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut bus = EventBus::new();
    bus.add_sink(Box::new(SharedSink(Arc::clone(&events))));

    let (mut scene, mut cables, couplings) = cable_scene(0.05);
    let properties = demo_properties();
    {
        let mut rollout = Rollout::new(
            &properties,
            &mut cables,
            &couplings,
            CheckpointMode::Checkpointed,
        )
        .unwrap()
        .with_telemetry(&mut bus);

        let (position, _) = rollout.forward(&mut scene).unwrap();
        let grad_position = loss_weights(position.len());
        let grad_velocity = vec![Vec3::ZERO; position.len()];
        rollout
            .backward(&mut scene, &grad_position, &grad_velocity)
            .unwrap();
    }
    bus.finalize();

    let events = events.lock().unwrap();
    let num_segments = properties.num_segments() as usize;

    let forward: Vec<bool> = events
        .iter()
        .filter_map(|e| match e.kind {
            EventKind::SegmentForward { recompute, .. } => Some(recompute),
            _ => None,
        })
        .collect();
    // One original forward per segment plus one recompute per segment.
    assert_eq!(forward.iter().filter(|r| !**r).count(), num_segments);
    assert_eq!(forward.iter().filter(|r| **r).count(), num_segments);

    let backward = events
        .iter()
        .filter(|e| matches!(e.kind, EventKind::SegmentBackward { .. }))
        .count();
    assert_eq!(backward, num_segments);

    assert!(events
        .iter()
        .any(|e| matches!(e.kind, EventKind::RolloutBegin { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e.kind, EventKind::RolloutEnd { .. })));
}
