//! The narrow interface between the evolutionary core and a Boolean-function
//! back end.
//!
//! The evaluator only ever needs to build projection functions, combine two
//! functions under a [`Gate`], and count satisfying assignments. Pool
//! statistics and garbage collection exist for the resource guard. Handles
//! that must survive a collection are registered with [`FunctionEngine::protect`].

use thiserror::Error;

use crate::gate::Gate;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("node pool exhausted (capacity {capacity})")]
    PoolExhausted { capacity: usize },

    #[error("{requested} variables requested, back end supports at most {limit}")]
    TooManyVariables { requested: usize, limit: usize },

    #[error("satisfying-assignment count does not fit into 64 bits")]
    CountOverflow,
}

pub trait FunctionEngine {
    type Function: Clone;

    /// Projection function of primary input `index` (0-based).
    fn projection(&self, index: usize) -> Result<Self::Function, EngineError>;

    fn constant(&self, value: bool) -> Self::Function;

    /// Compose `gate(a, b)`. Unary gates ignore `b`.
    fn combine(
        &self,
        gate: Gate,
        a: &Self::Function,
        b: &Self::Function,
    ) -> Result<Self::Function, EngineError>;

    /// Number of assignments to `num_vars` inputs that satisfy `f`.
    fn satisfying_count(&self, f: &Self::Function, num_vars: usize) -> Result<u64, EngineError>;

    /// Nodes currently held by the back end.
    fn node_count(&self) -> usize;

    /// Capacity of the node pool; 0 when the back end has no pool.
    fn allocated_capacity(&self) -> usize;

    /// Keep `f` (and everything it depends on) alive across collections.
    fn protect(&self, f: &Self::Function);

    /// Drop everything not reachable from protected functions.
    fn garbage_collect(&self);

    fn shutdown(self)
    where
        Self: Sized,
    {
    }
}
