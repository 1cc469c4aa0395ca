//! Memory-pressure check run between generations.
//!
//! Protected inputs and targets survive a collection; intermediate gate
//! functions are rebuilt on the next evaluation.

use log::debug;

use crate::engine::FunctionEngine;

/// Triggers a collection when the engine's node pool fills past a threshold.
#[derive(Debug, Copy, Clone)]
pub struct ResourceGuard {
    threshold: f64,
}

impl ResourceGuard {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Returns whether a collection ran.
    pub fn check<E: FunctionEngine>(&self, engine: &E) -> bool {
        let capacity = engine.allocated_capacity();
        if capacity == 0 {
            return false;
        }
        let used = engine.node_count();
        if (used as f64) < self.threshold * capacity as f64 {
            return false;
        }
        engine.garbage_collect();
        debug!(
            "Pool at {}/{} nodes, collected down to {}",
            used,
            capacity,
            engine.node_count()
        );
        true
    }
}
