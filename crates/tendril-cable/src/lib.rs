//! # tendril-cable
//!
//! Cable actuation for the Tendril engine.
//!
//! A cable is an ordered chain of holes threaded through the deformable
//! body, a pull-ratio schedule (the control input being optimized), and
//! two physical constants (stiffness, damping). Hole motion is derived
//! from node motion through a barycentric coupling operator built once
//! from the rest configuration; hole forces flow back to the nodes
//! through the coupling's pseudo-inverse.

pub mod cable;
pub mod coupling;
pub mod force;
pub mod holes;
pub mod pull_ratio;

pub use cable::Cable;
pub use coupling::{Coupling, CouplingFactory};
pub use force::{cable_force, cable_force_backward, CableForceGrads};
pub use holes::Holes;
pub use pull_ratio::{PullRatio, TimeInvariablePullRatio, TimeVariablePullRatio};
