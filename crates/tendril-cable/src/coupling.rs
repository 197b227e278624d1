//! Barycentric coupling between holes and mesh nodes.
//!
//! The gather operator (holes × nodes) expresses each hole as a convex
//! combination of the four vertices of the tetrahedron containing it in
//! the rest configuration. The scatter operator (nodes × holes) is its
//! Moore-Penrose pseudo-inverse. Both are built once at scene
//! construction and are immutable afterwards: the mesh deforms, but
//! which tetrahedron owns which hole is fixed at rest.

use glam::Vec3;
use nalgebra::DMatrix;
use tendril_math::tetra::{barycentric_coordinates, point_in_tetrahedron};
use tendril_math::{ops, pinv};
use tendril_mesh::Mesh;
use tendril_types::constants::BARYCENTRIC_SUM_TOLERANCE;
use tendril_types::{Scalar, TendrilError, TendrilResult};

use crate::holes::Holes;

/// The gather/scatter operator pair for one cable.
#[derive(Debug, Clone)]
pub struct Coupling {
    gather: DMatrix<Scalar>,
    scatter: DMatrix<Scalar>,
}

impl Coupling {
    /// Wraps a gather/scatter pair, validating the gather invariant:
    /// every row must sum to 1 (a valid affine combination).
    pub fn new(gather: DMatrix<Scalar>, scatter: DMatrix<Scalar>) -> TendrilResult<Self> {
        if scatter.nrows() != gather.ncols() || scatter.ncols() != gather.nrows() {
            return Err(TendrilError::InvalidCoupling(format!(
                "Scatter shape {}×{} does not transpose gather shape {}×{}",
                scatter.nrows(),
                scatter.ncols(),
                gather.nrows(),
                gather.ncols()
            )));
        }
        for i in 0..gather.nrows() {
            let sum: Scalar = gather.row(i).iter().sum();
            if (sum - 1.0).abs() > BARYCENTRIC_SUM_TOLERANCE {
                return Err(TendrilError::InvalidCoupling(format!(
                    "Gather row {i} sums to {sum}, expected 1"
                )));
            }
        }
        Ok(Self { gather, scatter })
    }

    /// The gather operator (holes × nodes).
    #[inline]
    pub fn gather(&self) -> &DMatrix<Scalar> {
        &self.gather
    }

    /// The scatter operator (nodes × holes).
    #[inline]
    pub fn scatter(&self) -> &DMatrix<Scalar> {
        &self.scatter
    }

    /// Gathers a node-space array into hole space: `Gather · x`.
    pub fn gather_values(&self, nodes: &[Vec3]) -> TendrilResult<Vec<Vec3>> {
        ops::apply(&self.gather, nodes)
    }

    /// Scatters a hole-space array into node space: `Scatter · x`.
    pub fn scatter_values(&self, holes: &[Vec3]) -> TendrilResult<Vec<Vec3>> {
        ops::apply(&self.scatter, holes)
    }

    /// Adjoint of [`Self::gather_values`]: `Gatherᵀ · x`.
    pub fn gather_adjoint(&self, holes: &[Vec3]) -> TendrilResult<Vec<Vec3>> {
        ops::apply_transpose(&self.gather, holes)
    }

    /// Adjoint of [`Self::scatter_values`]: `Scatterᵀ · x`.
    pub fn scatter_adjoint(&self, nodes: &[Vec3]) -> TendrilResult<Vec<Vec3>> {
        ops::apply_transpose(&self.scatter, nodes)
    }
}

/// Builds the coupling for one cable from the rest configuration.
pub struct CouplingFactory<'a> {
    mesh: &'a Mesh,
    holes: &'a Holes,
}

impl<'a> CouplingFactory<'a> {
    /// Creates a factory over a mesh and one cable's holes, both in
    /// rest configuration.
    pub fn new(mesh: &'a Mesh, holes: &'a Holes) -> Self {
        Self { mesh, holes }
    }

    /// Builds the gather/scatter pair.
    ///
    /// For each hole, tetrahedra are scanned in ascending index order
    /// and the first containing one wins; a hole exactly on a shared
    /// face may satisfy the containment test for several tetrahedra,
    /// and the fixed scan order makes the choice deterministic
    /// (smallest index). A hole contained by no tetrahedron is a
    /// configuration error, surfaced here rather than as a silent
    /// all-zero gather row.
    pub fn create(&self) -> TendrilResult<Coupling> {
        let num_holes = self.holes.len();
        let num_nodes = self.mesh.nodes.len();
        let positions = &self.mesh.nodes.position;

        let mut gather = DMatrix::<Scalar>::zeros(num_holes, num_nodes);

        for (h, &hole) in self.holes.position.iter().enumerate() {
            let mut matched = false;
            for tet in &self.mesh.elements.tetrahedra {
                let [a, b, c, d] = tet.map(|i| i as usize);
                let (pa, pb, pc, pd) = (positions[a], positions[b], positions[c], positions[d]);
                if point_in_tetrahedron(pa, pb, pc, pd, hole) {
                    let w = barycentric_coordinates(pa, pb, pc, pd, hole);
                    gather[(h, a)] = w[0];
                    gather[(h, b)] = w[1];
                    gather[(h, c)] = w[2];
                    gather[(h, d)] = w[3];
                    matched = true;
                    break;
                }
            }
            if !matched {
                return Err(TendrilError::InvalidCoupling(format!(
                    "Hole {h} at {hole:?} lies outside every tetrahedron of the mesh"
                )));
            }
        }

        let scatter = pinv::pseudo_inverse(&gather)?;
        Coupling::new(gather, scatter)
    }
}
