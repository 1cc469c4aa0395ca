//! Brute-force back end: every function is its full truth table.
//!
//! Useful for small input widths and as a cross-check for the BDD engine.
//! Bit `i` of a table is the function value on the assignment whose input `k`
//! equals bit `k` of `i`.

use bitvec::prelude::*;

use crate::engine::{EngineError, FunctionEngine};
use crate::gate::Gate;

/// Largest supported input width (a table then takes 128 KiB).
pub const MAX_VARS: usize = 20;

pub type TruthTable = BitVec<u64, Lsb0>;

#[derive(Debug)]
pub struct Exhaustive {
    num_vars: usize,
}

impl Exhaustive {
    pub fn new(num_vars: usize) -> Result<Self, EngineError> {
        if num_vars > MAX_VARS {
            return Err(EngineError::TooManyVariables {
                requested: num_vars,
                limit: MAX_VARS,
            });
        }
        Ok(Self { num_vars })
    }

    fn size(&self) -> usize {
        1 << self.num_vars
    }
}

impl FunctionEngine for Exhaustive {
    type Function = TruthTable;

    fn projection(&self, index: usize) -> Result<TruthTable, EngineError> {
        if index >= self.num_vars {
            return Err(EngineError::TooManyVariables {
                requested: index + 1,
                limit: self.num_vars,
            });
        }
        Ok((0..self.size()).map(|i| (i >> index) & 1 == 1).collect())
    }

    fn constant(&self, value: bool) -> TruthTable {
        BitVec::repeat(value, self.size())
    }

    fn combine(&self, gate: Gate, a: &TruthTable, b: &TruthTable) -> Result<TruthTable, EngineError> {
        let res = match gate {
            Gate::And => a.clone() & b.as_bitslice(),
            Gate::Or => a.clone() | b.as_bitslice(),
            Gate::Not => !a.clone(),
            Gate::Nand => !(a.clone() & b.as_bitslice()),
            Gate::Nor => !(a.clone() | b.as_bitslice()),
            Gate::Xor => a.clone() ^ b.as_bitslice(),
            Gate::Xnor => !(a.clone() ^ b.as_bitslice()),
            Gate::Wire => a.clone(),
        };
        Ok(res)
    }

    fn satisfying_count(&self, f: &TruthTable, num_vars: usize) -> Result<u64, EngineError> {
        // Inputs beyond the table width are free.
        let extra = num_vars.saturating_sub(self.num_vars);
        let ones = f.count_ones() as u64;
        1u64.checked_shl(extra as u32)
            .and_then(|scale| ones.checked_mul(scale))
            .ok_or(EngineError::CountOverflow)
    }

    fn node_count(&self) -> usize {
        0
    }

    fn allocated_capacity(&self) -> usize {
        0
    }

    fn protect(&self, _f: &TruthTable) {}

    fn garbage_collect(&self) {}
}
