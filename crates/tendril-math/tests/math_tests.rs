//! Integration tests for tendril-math.

use glam::Vec3;
use nalgebra::DMatrix;
use tendril_math::ops::{apply, apply_transpose};
use tendril_math::pinv::pseudo_inverse;
use tendril_math::tetra::{barycentric_coordinates, point_in_tetrahedron, signed_distance};
use tendril_types::Scalar;

fn unit_tet() -> [Vec3; 4] {
    [
        Vec3::ZERO,
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
    ]
}

// ─── Tetrahedron geometry ────────────────────────────────────

#[test]
fn signed_distance_is_zero_on_plane() {
    let [a, b, c, _] = unit_tet();
    // Any point in the z=0 plane is on the plane (a, b, c).
    let q = Vec3::new(0.3, 0.9, 0.0);
    assert!(signed_distance(a, b, c, q).abs() < 1e-6);
}

#[test]
fn signed_distance_changes_sign_across_plane() {
    let [a, b, c, _] = unit_tet();
    let above = signed_distance(a, b, c, Vec3::new(0.2, 0.2, 0.5));
    let below = signed_distance(a, b, c, Vec3::new(0.2, 0.2, -0.5));
    assert!(above * below < 0.0);
}

#[test]
fn centroid_is_inside_tetrahedron() {
    let [a, b, c, d] = unit_tet();
    let centroid = (a + b + c + d) / 4.0;
    assert!(point_in_tetrahedron(a, b, c, d, centroid));
}

#[test]
fn outside_point_is_rejected() {
    let [a, b, c, d] = unit_tet();
    assert!(!point_in_tetrahedron(a, b, c, d, Vec3::new(1.0, 1.0, 1.0)));
    assert!(!point_in_tetrahedron(a, b, c, d, Vec3::new(-0.1, 0.1, 0.1)));
}

#[test]
fn boundary_points_are_inclusive() {
    let [a, b, c, d] = unit_tet();
    // Vertices, an edge midpoint, and a face point all count as inside.
    assert!(point_in_tetrahedron(a, b, c, d, a));
    assert!(point_in_tetrahedron(a, b, c, d, (a + b) / 2.0));
    assert!(point_in_tetrahedron(a, b, c, d, Vec3::new(0.25, 0.25, 0.0)));
}

#[test]
fn barycentric_sums_to_one_and_reconstructs() {
    let [a, b, c, d] = unit_tet();
    let q = Vec3::new(0.2, 0.1, 0.3);
    let w = barycentric_coordinates(a, b, c, d, q);

    let sum: f32 = w.iter().sum();
    assert!((sum - 1.0).abs() < 1e-5, "sum = {sum}");
    assert!(w.iter().all(|&wi| wi >= 0.0));

    let rec = a * w[0] + b * w[1] + c * w[2] + d * w[3];
    assert!((rec - q).length() < 1e-5);
}

#[test]
fn barycentric_at_vertex_is_one_hot() {
    let [a, b, c, d] = unit_tet();
    let w = barycentric_coordinates(a, b, c, d, b);
    assert!((w[1] - 1.0).abs() < 1e-6);
    assert!(w[0].abs() < 1e-6 && w[2].abs() < 1e-6 && w[3].abs() < 1e-6);
}

// ─── Pseudo-inverse ──────────────────────────────────────────

#[test]
fn pinv_of_full_row_rank_matrix_is_right_inverse() {
    let a = DMatrix::<Scalar>::from_row_slice(
        2,
        4,
        &[0.1, 0.2, 0.3, 0.4, 0.25, 0.25, 0.25, 0.25],
    );
    let pinv = pseudo_inverse(&a).unwrap();
    assert_eq!(pinv.nrows(), 4);
    assert_eq!(pinv.ncols(), 2);

    let identity = &a * &pinv;
    for i in 0..2 {
        for j in 0..2 {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert!(
                (identity[(i, j)] - expected).abs() < 1e-4,
                "A·A⁺ [{i},{j}] = {}",
                identity[(i, j)]
            );
        }
    }
}

#[test]
fn pinv_rejects_empty_matrix() {
    let a = DMatrix::<Scalar>::zeros(0, 3);
    assert!(pseudo_inverse(&a).is_err());
}

// ─── Matrix × Vec3-array products ────────────────────────────

#[test]
fn apply_matches_manual_product() {
    let m = DMatrix::<Scalar>::from_row_slice(1, 2, &[0.5, 0.5]);
    let x = vec![Vec3::new(1.0, 0.0, 2.0), Vec3::new(3.0, 4.0, 0.0)];
    let y = apply(&m, &x).unwrap();
    assert_eq!(y.len(), 1);
    assert!((y[0] - Vec3::new(2.0, 2.0, 1.0)).length() < 1e-6);
}

#[test]
fn transpose_apply_is_adjoint_of_apply() {
    // ⟨M x, y⟩ == ⟨x, Mᵀ y⟩ for arbitrary x, y.
    let m = DMatrix::<Scalar>::from_row_slice(2, 3, &[1.0, 2.0, 0.0, 0.5, 0.0, 3.0]);
    let x = vec![
        Vec3::new(1.0, -1.0, 0.5),
        Vec3::new(0.0, 2.0, 1.0),
        Vec3::new(3.0, 0.0, -2.0),
    ];
    let y = vec![Vec3::new(0.5, 1.0, -1.0), Vec3::new(2.0, -0.5, 0.0)];

    let mx = apply(&m, &x).unwrap();
    let mty = apply_transpose(&m, &y).unwrap();

    let lhs: f32 = mx.iter().zip(&y).map(|(a, b)| a.dot(*b)).sum();
    let rhs: f32 = x.iter().zip(&mty).map(|(a, b)| a.dot(*b)).sum();
    assert!((lhs - rhs).abs() < 1e-4, "{lhs} vs {rhs}");
}

#[test]
fn apply_rejects_wrong_length() {
    let m = DMatrix::<Scalar>::zeros(2, 3);
    assert!(apply(&m, &[Vec3::ZERO; 2]).is_err());
    assert!(apply_transpose(&m, &[Vec3::ZERO; 3]).is_err());
}
