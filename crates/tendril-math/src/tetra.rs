//! Tetrahedron geometry: signed distances, containment, barycentric
//! coordinates.
//!
//! The containment test follows the four-face signed-distance-product
//! form: a point lies in the tetrahedron iff, for every face, the point
//! and the opposite vertex are on the same side of that face's plane.
//! Zero products are treated as boundary-inclusive.

use glam::Vec3;
use tendril_types::Scalar;

/// Unit vector perpendicular to the plane through `p1`, `p2`, `p3`.
#[inline]
pub fn face_normal(p1: Vec3, p2: Vec3, p3: Vec3) -> Vec3 {
    (p2 - p1).cross(p3 - p1).normalize()
}

/// Signed distance between the plane `(p1, p2, p3)` and point `q`.
///
/// Points on one side of the plane have positive distance, points on
/// the other side negative. A point on the plane has distance zero.
#[inline]
pub fn signed_distance(p1: Vec3, p2: Vec3, p3: Vec3, q: Vec3) -> Scalar {
    (q - p1).dot(face_normal(p1, p2, p3))
}

/// Returns true if `q` lies inside or on the tetrahedron `(p1, p2, p3, p4)`.
pub fn point_in_tetrahedron(p1: Vec3, p2: Vec3, p3: Vec3, p4: Vec3, q: Vec3) -> bool {
    let a = signed_distance(p2, p3, p4, q) * signed_distance(p2, p3, p4, p1);
    let b = signed_distance(p1, p3, p4, q) * signed_distance(p1, p3, p4, p2);
    let c = signed_distance(p1, p2, p4, q) * signed_distance(p1, p2, p4, p3);
    let d = signed_distance(p1, p2, p3, q) * signed_distance(p1, p2, p3, p4);
    let all_non_negative = a >= 0.0 && b >= 0.0 && c >= 0.0 && d >= 0.0;
    let all_non_positive = a <= 0.0 && b <= 0.0 && c <= 0.0 && d <= 0.0;
    all_non_negative || all_non_positive
}

/// Barycentric coordinates of `q` w.r.t. the tetrahedron `(p1, p2, p3, p4)`.
///
/// Each coordinate is the ratio of two signed distances (equivalently,
/// two signed tetrahedral volumes). The four coordinates sum to 1; all
/// four are non-negative iff `q` is inside or on the tetrahedron:
/// three non-zero → on a face, two → on an edge, one → at a vertex.
pub fn barycentric_coordinates(p1: Vec3, p2: Vec3, p3: Vec3, p4: Vec3, q: Vec3) -> [Scalar; 4] {
    [
        signed_distance(p2, p3, p4, q) / signed_distance(p2, p3, p4, p1),
        signed_distance(p1, p3, p4, q) / signed_distance(p1, p3, p4, p2),
        signed_distance(p1, p2, p4, q) / signed_distance(p1, p2, p4, p3),
        signed_distance(p1, p2, p3, q) / signed_distance(p1, p2, p3, p4),
    ]
}
