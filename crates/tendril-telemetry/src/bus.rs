//! Event bus — broadcast-style event dispatch with pluggable sinks.
//!
//! The bus uses `std::sync::mpsc` for thread-safe event delivery.
//! Sinks are registered once at initialization and receive events
//! when the bus is flushed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use crate::events::RolloutEvent;
use crate::sinks::EventSink;

/// Broadcast event bus for rollout telemetry.
///
/// The producer side (`emit`, or an [`EventEmitter`] handle) sends
/// events to all registered sinks. The rollout engine flushes at
/// segment boundaries so sinks never run inside the per-step pipeline.
pub struct EventBus {
    /// Channel sender — cloned once per bus instance.
    sender: mpsc::Sender<RolloutEvent>,
    /// Channel receiver — owned by the bus for dispatching to sinks.
    receiver: mpsc::Receiver<RolloutEvent>,
    /// Registered sinks.
    sinks: Vec<Box<dyn EventSink>>,
    /// Whether the bus is active, shared with its emitters. Disabled
    /// bus is a no-op.
    enabled: Arc<AtomicBool>,
}

/// Cheap cloneable producer handle onto a bus's channel.
///
/// Components that outlive or run beside the bus borrower (the scene
/// lifecycle, custom instrumentation) hold one of these and emit
/// without touching the consumer side.
#[derive(Clone)]
pub struct EventEmitter {
    sender: mpsc::Sender<RolloutEvent>,
    enabled: Arc<AtomicBool>,
}

impl EventEmitter {
    /// Emit an event. If the bus is disabled, this is a no-op.
    pub fn emit(&self, event: RolloutEvent) {
        if !self.enabled.load(Ordering::Relaxed) {
            return;
        }
        // Ignore error if receiver is somehow dropped.
        let _ = self.sender.send(event);
    }
}

impl EventBus {
    /// Creates a new event bus with no sinks.
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            sinks: Vec::new(),
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Registers a sink to receive events.
    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Returns a producer handle that emits into this bus.
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter {
            sender: self.sender.clone(),
            enabled: Arc::clone(&self.enabled),
        }
    }

    /// Enables or disables the bus and all its emitters. Disabled bus
    /// drops events silently.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Returns true if the bus is active.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Emit an event. If the bus is disabled, this is a no-op.
    pub fn emit(&self, event: RolloutEvent) {
        if !self.is_enabled() {
            return;
        }
        // Ignore error if receiver is somehow dropped.
        let _ = self.sender.send(event);
    }

    /// Flush all pending events to registered sinks.
    ///
    /// Called by the rollout at segment boundaries and at shutdown
    /// to ensure all events are processed.
    pub fn flush(&mut self) {
        while let Ok(event) = self.receiver.try_recv() {
            for sink in &mut self.sinks {
                sink.handle(&event);
            }
        }
    }

    /// Notifies all sinks that the run is over.
    pub fn finalize(&mut self) {
        self.flush();
        for sink in &mut self.sinks {
            sink.finalize();
        }
    }

    /// Returns the number of registered sinks.
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
