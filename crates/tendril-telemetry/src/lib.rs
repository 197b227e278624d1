//! # tendril-telemetry
//!
//! Event bus for rollout telemetry. Emits structured events (segment
//! forward/recompute progress, backward sweep, scene resets) that can
//! be consumed by pluggable sinks (in-memory buffers, `tracing`, etc.).

pub mod bus;
pub mod events;
pub mod sinks;

pub use bus::{EventBus, EventEmitter};
pub use events::{EventKind, RolloutEvent};
pub use sinks::{EventSink, TracingSink, VecSink};
