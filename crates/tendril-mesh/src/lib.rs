//! # tendril-mesh
//!
//! Tetrahedral mesh types for the Tendril engine: per-node state
//! arrays (position, velocity, force), element connectivity, physical
//! properties, and deterministic procedural generators for tests and
//! benchmarks.
//!
//! File loading is out of scope — meshes arrive from an external
//! loader or from [`generators`].

pub mod generators;
pub mod mesh;

pub use mesh::{Elements, Mesh, MeshProperties, Nodes};
