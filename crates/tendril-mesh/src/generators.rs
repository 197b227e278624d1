//! Procedural mesh generators for benchmarks and testing.
//!
//! These generators produce deterministic, resolution-configurable
//! tetrahedral meshes. Real robot geometry is loaded externally; these
//! exist so the simulation core can be exercised without any files.

use glam::Vec3;
use tendril_types::Scalar;

use crate::mesh::{Elements, Mesh, MeshProperties, Nodes};

/// Generates a single tetrahedron spanning the unit corner.
///
/// Vertices: origin plus the three axis unit points, scaled by `size`.
///
/// # Example
/// ```
/// use tendril_mesh::generators::single_tetrahedron;
/// let mesh = single_tetrahedron(1.0);
/// assert_eq!(mesh.nodes.len(), 4);
/// assert_eq!(mesh.elements.num_tetrahedra(), 1);
/// ```
pub fn single_tetrahedron(size: Scalar) -> Mesh {
    let position = vec![
        Vec3::ZERO,
        Vec3::new(size, 0.0, 0.0),
        Vec3::new(0.0, size, 0.0),
        Vec3::new(0.0, 0.0, size),
    ];
    let elements = Elements {
        tetrahedra: vec![[0, 1, 2, 3]],
        triangles: vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
    };
    Mesh {
        nodes: Nodes::at_rest(position),
        elements,
        properties: MeshProperties::default(),
    }
}

/// Generates an axis-aligned block of `nx × ny × nz` cells, each cell
/// split into six tetrahedra (Kuhn subdivision along the main
/// diagonal). The block spans `[0, nx·cell] × [0, ny·cell] × [0, nz·cell]`.
///
/// # Example
/// ```
/// use tendril_mesh::generators::tet_block;
/// let mesh = tet_block(2, 1, 1, 0.5);
/// assert_eq!(mesh.nodes.len(), 3 * 2 * 2);
/// assert_eq!(mesh.elements.num_tetrahedra(), 2 * 6);
/// ```
pub fn tet_block(nx: usize, ny: usize, nz: usize, cell: Scalar) -> Mesh {
    let (vx, vy, vz) = (nx + 1, ny + 1, nz + 1);

    let mut position = Vec::with_capacity(vx * vy * vz);
    for k in 0..vz {
        for j in 0..vy {
            for i in 0..vx {
                position.push(Vec3::new(
                    i as Scalar * cell,
                    j as Scalar * cell,
                    k as Scalar * cell,
                ));
            }
        }
    }

    let index = |i: usize, j: usize, k: usize| -> u32 { (k * vy * vx + j * vx + i) as u32 };

    // Six tetrahedra per cell, all sharing the main diagonal 000–111.
    // Each tet walks one axis permutation from the low corner to the
    // high corner.
    const PATHS: [[usize; 3]; 6] = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];

    let mut tetrahedra = Vec::with_capacity(nx * ny * nz * 6);
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let corner = |bits: [usize; 3]| index(i + bits[0], j + bits[1], k + bits[2]);
                for path in PATHS {
                    let mut bits = [0usize; 3];
                    let low = corner(bits);
                    bits[path[0]] = 1;
                    let mid_a = corner(bits);
                    bits[path[1]] = 1;
                    let mid_b = corner(bits);
                    let high = corner([1, 1, 1]);
                    tetrahedra.push([low, mid_a, mid_b, high]);
                }
            }
        }
    }

    Mesh {
        nodes: Nodes::at_rest(position),
        elements: Elements {
            tetrahedra,
            triangles: Vec::new(),
        },
        properties: MeshProperties::default(),
    }
}
