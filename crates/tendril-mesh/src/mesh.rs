//! Core tetrahedral mesh type.
//!
//! A mesh is per-node state (position, velocity, force — N rows of
//! `Vec3`) plus element connectivity (tetrahedra for the volume,
//! triangles for the surface). Node state is mutated in place every
//! simulation step; connectivity is fixed after construction.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tendril_types::constants::EPSILON;
use tendril_types::{Scalar, TendrilError, TendrilResult};

/// Per-node simulation state.
///
/// All three arrays always have the same length. `force` is the
/// external force accumulator, zeroed at the start of every step.
#[derive(Debug, Clone)]
pub struct Nodes {
    /// Node positions (meters).
    pub position: Vec<Vec3>,
    /// Node velocities (m/s).
    pub velocity: Vec<Vec3>,
    /// External force accumulator (N).
    pub force: Vec<Vec3>,
}

impl Nodes {
    /// Creates nodes at the given rest positions, at rest (zero
    /// velocity, zero force).
    pub fn at_rest(position: Vec<Vec3>) -> Self {
        let n = position.len();
        Self {
            position,
            velocity: vec![Vec3::ZERO; n],
            force: vec![Vec3::ZERO; n],
        }
    }

    /// Returns the node count.
    #[inline]
    pub fn len(&self) -> usize {
        self.position.len()
    }

    /// Returns true if there are no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    /// Zeroes the external force accumulator.
    pub fn clear_forces(&mut self) {
        self.force.fill(Vec3::ZERO);
    }

    /// Checks array-length consistency and that every value is finite.
    pub fn validate(&self) -> TendrilResult<()> {
        let n = self.position.len();
        if self.velocity.len() != n {
            return Err(TendrilError::ShapeMismatch {
                context: "node velocity".into(),
                expected: n,
                actual: self.velocity.len(),
            });
        }
        if self.force.len() != n {
            return Err(TendrilError::ShapeMismatch {
                context: "node force".into(),
                expected: n,
                actual: self.force.len(),
            });
        }
        for (name, array) in [
            ("position", &self.position),
            ("velocity", &self.velocity),
            ("force", &self.force),
        ] {
            if array.iter().any(|v| !v.is_finite()) {
                return Err(TendrilError::InvalidMesh(format!(
                    "Non-finite value in node {name} array"
                )));
            }
        }
        Ok(())
    }
}

/// Element connectivity referencing node indices.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Elements {
    /// Volume elements — each tetrahedron is four node indices.
    pub tetrahedra: Vec<[u32; 4]>,
    /// Surface triangles, as exposed to the rendering/loss layer.
    pub triangles: Vec<[u32; 3]>,
}

impl Elements {
    /// Returns the tetrahedron count.
    #[inline]
    pub fn num_tetrahedra(&self) -> usize {
        self.tetrahedra.len()
    }
}

/// Physical properties of a deformable mesh.
///
/// `frozen_bounding_box` marks the region whose nodes are held fixed
/// (the mounting plate of a gripper, the anchor of a locomotor): any
/// node inside the axis-aligned box gets infinite mass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshProperties {
    /// Material density (kg/m³).
    pub density: Scalar,
    /// Axis-aligned box `[min, max]` of frozen nodes, or `None`.
    pub frozen_bounding_box: Option<[[Scalar; 3]; 2]>,
}

impl Default for MeshProperties {
    fn default() -> Self {
        Self {
            density: 1080.0,
            frozen_bounding_box: None,
        }
    }
}

/// A deformable tetrahedral mesh (or a static obstacle surface, in
/// which case `tetrahedra` may be empty).
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Mutable per-node state.
    pub nodes: Nodes,
    /// Immutable connectivity.
    pub elements: Elements,
    /// Physical properties.
    pub properties: MeshProperties,
}

impl Mesh {
    /// Creates a mesh and validates it.
    pub fn new(nodes: Nodes, elements: Elements, properties: MeshProperties) -> TendrilResult<Self> {
        let mesh = Self {
            nodes,
            elements,
            properties,
        };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Validates mesh integrity.
    ///
    /// Checks:
    /// - Node state arrays are consistent and finite
    /// - Every element index is < node count
    /// - No degenerate elements (repeated node indices, or a volume
    ///   collapsed to numerically zero)
    pub fn validate(&self) -> TendrilResult<()> {
        self.nodes.validate()?;

        let n = self.nodes.len() as u32;
        for (t, tet) in self.elements.tetrahedra.iter().enumerate() {
            for &idx in tet {
                if idx >= n {
                    return Err(TendrilError::InvalidMesh(format!(
                        "Tetrahedron {t} references node {idx} (node count: {n})"
                    )));
                }
            }
            let [a, b, c, d] = *tet;
            if a == b || a == c || a == d || b == c || b == d || c == d {
                return Err(TendrilError::InvalidMesh(format!(
                    "Tetrahedron {t} has repeated node indices: {tet:?}"
                )));
            }
            let volume = self.tetrahedron_volume(t);
            if volume.abs() <= EPSILON {
                return Err(TendrilError::InvalidMesh(format!(
                    "Tetrahedron {t} is degenerate (volume {volume})"
                )));
            }
        }
        for (t, tri) in self.elements.triangles.iter().enumerate() {
            for &idx in tri {
                if idx >= n {
                    return Err(TendrilError::InvalidMesh(format!(
                        "Triangle {t} references node {idx} (node count: {n})"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Signed volume of tetrahedron `t` in the current configuration.
    pub fn tetrahedron_volume(&self, t: usize) -> Scalar {
        let [a, b, c, d] = self.elements.tetrahedra[t];
        let p = &self.nodes.position;
        let (pa, pb, pc, pd) = (
            p[a as usize],
            p[b as usize],
            p[c as usize],
            p[d as usize],
        );
        (pb - pa).cross(pc - pa).dot(pd - pa) / 6.0
    }

    /// Total volume of the mesh in the current configuration.
    pub fn volume(&self) -> Scalar {
        (0..self.elements.num_tetrahedra())
            .map(|t| self.tetrahedron_volume(t).abs())
            .sum()
    }
}
