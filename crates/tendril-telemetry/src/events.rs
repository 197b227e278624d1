//! Rollout event types.
//!
//! Structured events emitted by the simulation engine at segment and
//! rollout boundaries. Events are lightweight value types that carry
//! just enough data to be useful for monitoring long optimizations.

use serde::{Deserialize, Serialize};

/// An event emitted by the rollout engine.
///
/// Events are tagged with the global fine-step index at which they
/// were emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolloutEvent {
    /// Global fine-step index (0-indexed).
    pub step: u64,
    /// Event payload.
    pub kind: EventKind,
}

/// Event payload variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventKind {
    /// A rollout started.
    RolloutBegin {
        /// Number of checkpointed segments.
        num_segments: u32,
        /// Fine steps per segment.
        steps_per_segment: u32,
    },

    /// A segment's forward pass completed.
    SegmentForward {
        /// Segment index (0-indexed).
        segment: u32,
        /// True when this is the recomputation run during the
        /// backward sweep rather than the original forward pass.
        recompute: bool,
        /// Wall-clock time for the segment (seconds).
        wall_time: f64,
    },

    /// A segment's adjoint sweep completed.
    SegmentBackward {
        /// Segment index (0-indexed).
        segment: u32,
        /// Wall-clock time for the adjoint sweep (seconds).
        wall_time: f64,
    },

    /// The rollout's forward pass completed.
    RolloutEnd {
        /// Wall-clock time for the whole rollout (seconds).
        wall_time: f64,
    },

    /// The scene was reset to its initial snapshot.
    SceneReset,

    /// Custom event for extensibility.
    Custom {
        /// Arbitrary label.
        label: String,
        /// JSON-encoded payload.
        payload: String,
    },
}

impl RolloutEvent {
    /// Creates a new event at the given global step index.
    pub fn new(step: u64, kind: EventKind) -> Self {
        Self { step, kind }
    }
}
