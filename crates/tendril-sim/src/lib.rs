//! # tendril-sim
//!
//! The differentiable rollout engine: the per-step pipeline coupling
//! cables to the deformable mesh, the opaque time-integration boundary,
//! the segmented checkpointed rollout that makes long-horizon gradients
//! memory-tractable, and the scene lifecycle (snapshot/reset) that lets
//! an optimizer restart from the same initial condition every
//! iteration.
//!
//! The per-step data flow, repeated `steps_per_segment` times per
//! segment and `num_segments` times per trajectory:
//!
//! ```text
//! gather hole state ← nodes          (coupling)
//! pull ratio at the global step      (schedule)
//! hole forces                        (tension model)
//! scatter + sum into node forces     (coupling⁺)
//! advance one dt                     (integration boundary)
//! ```

pub mod integrator;
pub mod pipeline;
pub mod properties;
pub mod rollout;
pub mod scene;
pub mod semi_implicit;

pub use integrator::{Integrator, IntegratorState, StepGrads, StepInput, StepOutput, StepTrace};
pub use properties::SimulationProperties;
pub use rollout::{CheckpointMode, Gradients, Rollout};
pub use scene::Scene;
pub use semi_implicit::{ContactProperties, SemiImplicitIntegrator, WorldModel, WorldModelBuilder};
